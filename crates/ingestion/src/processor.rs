//! Document processor
//!
//! Core ingestion step: extract the text of a file, hash it, and split it
//! into chunks ready for embedding.

use crate::chunker::{chunk_text, ChunkingConfig, TextChunk, TextFormat};
use crate::errors::IngestionError;
use crate::extract::{extract_text, ExtractedText};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, instrument};

/// Output of [`DocumentProcessor::process`]
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub extracted: ExtractedText,
    pub chunks: Vec<TextChunk>,
    /// Hex SHA-256 of the extracted text
    pub content_hash: String,
}

/// Ingestion processor
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    chunking_config: ChunkingConfig,
}

impl DocumentProcessor {
    pub fn new(chunking_config: ChunkingConfig) -> Self {
        Self { chunking_config }
    }

    pub fn chunking_config(&self) -> &ChunkingConfig {
        &self.chunking_config
    }

    /// Extract and chunk the file at `path`
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process(&self, path: &Path) -> Result<ProcessedDocument, IngestionError> {
        let extracted = extract_text(path).await?;

        let format = TextFormat::from_extension(&extracted.metadata.extension);
        let chunks = chunk_text(&extracted.text, &self.chunking_config, format)?;
        let content_hash = content_hash(&extracted.text);

        info!(
            extension = %extracted.metadata.extension,
            size_bytes = extracted.metadata.size_bytes,
            kind = ?extracted.kind,
            chunk_count = chunks.len(),
            "Document processed"
        );

        Ok(ProcessedDocument {
            extracted,
            chunks,
            content_hash,
        })
    }
}

/// Hex SHA-256 of a text
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_process_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello world").unwrap();

        let processed = DocumentProcessor::default().process(&path).await.unwrap();
        assert_eq!(processed.extracted.text, "hello world");
        assert_eq!(processed.chunks.len(), 1);
        assert_eq!(processed.content_hash, content_hash("hello world"));
    }

    #[tokio::test]
    async fn test_process_pdf_indexes_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7 binary").unwrap();

        let processed = DocumentProcessor::default().process(&path).await.unwrap();
        assert_eq!(processed.extracted.kind, ExtractionKind::Placeholder);
        assert_eq!(processed.chunks.len(), 1);
        assert_eq!(
            processed.chunks[0].content,
            "This is a placeholder for .pdf document processing"
        );
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash("a"), content_hash("b"));
    }
}
