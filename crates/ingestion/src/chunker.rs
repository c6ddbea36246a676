//! Text chunking module
//!
//! Splits extracted text into fixed-capacity, overlapping chunks for
//! embedding. Capacity and overlap are measured in characters. Markdown
//! documents are split on markdown structure, everything else on plain text
//! boundaries (paragraphs, sentences, words).

use crate::errors::IngestionError;
use docindex_common::config::IndexConfig;
use text_splitter::{ChunkConfig, MarkdownSplitter, TextSplitter};
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 100,
        }
    }
}

impl From<&IndexConfig> for ChunkingConfig {
    fn from(config: &IndexConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// Which splitter understands the document structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

impl TextFormat {
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".md" => TextFormat::Markdown,
            _ => TextFormat::Plain,
        }
    }
}

/// A text chunk with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk content
    pub content: String,
    /// Index of this chunk in the document
    pub index: usize,
    /// Start byte offset in the original text
    pub start_pos: usize,
    /// End byte offset in the original text
    pub end_pos: usize,
}

/// Split text into overlapping chunks for embedding
pub fn chunk_text(
    text: &str,
    config: &ChunkingConfig,
    format: TextFormat,
) -> Result<Vec<TextChunk>, IngestionError> {
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| IngestionError::Chunking(e.to_string()))?;

    let pieces: Vec<(usize, &str)> = match format {
        TextFormat::Plain => TextSplitter::new(chunk_config).chunk_indices(text).collect(),
        TextFormat::Markdown => MarkdownSplitter::new(chunk_config).chunk_indices(text).collect(),
    };

    let chunks: Vec<TextChunk> = pieces
        .into_iter()
        .enumerate()
        .map(|(index, (start_pos, content))| TextChunk {
            content: content.to_string(),
            index,
            start_pos,
            end_pos: start_pos + content.len(),
        })
        .collect();

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        format = ?format,
        "Text chunked"
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("hello world", &ChunkingConfig::default(), TextFormat::Plain).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello world");
        assert_eq!(chunks[0].start_pos, 0);
        assert_eq!(chunks[0].end_pos, 11);
    }

    #[test]
    fn test_long_text_respects_capacity() {
        let text = "This is a test sentence. ".repeat(200);
        let config = ChunkingConfig::default();

        let chunks = chunk_text(&text, &config, TextFormat::Plain).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.content.chars().count() <= config.chunk_size);
            assert_eq!(&text[chunk.start_pos..chunk.end_pos], chunk.content);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "word ".repeat(1000);
        let config = ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 50,
        };

        let chunks = chunk_text(&text, &config, TextFormat::Plain).unwrap();
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_pos < pair[0].end_pos, "chunks should share characters");
        }
    }

    #[test]
    fn test_markdown_format() {
        let text = format!("# Title\n\n{}\n\n## Section\n\n{}", "Intro. ".repeat(100), "Body. ".repeat(100));
        let config = ChunkingConfig {
            chunk_size: 300,
            chunk_overlap: 30,
        };

        let chunks = chunk_text(&text, &config, TextFormat::Markdown).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks[0].content.starts_with("# Title"));
        assert_eq!(TextFormat::from_extension(".md"), TextFormat::Markdown);
        assert_eq!(TextFormat::from_extension(".csv"), TextFormat::Plain);
    }

    #[test]
    fn test_empty_text() {
        let chunks = chunk_text("", &ChunkingConfig::default(), TextFormat::Plain).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_overlap_larger_than_capacity_is_rejected() {
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 20,
        };
        let err = chunk_text("some text", &config, TextFormat::Plain).unwrap_err();
        assert!(matches!(err, IngestionError::Chunking(_)));
    }
}
