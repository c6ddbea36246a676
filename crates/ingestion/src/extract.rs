//! Text extraction module
//!
//! Turns a file on disk into plain text. The behavior depends only on the
//! (case-insensitive) file extension:
//! - `.txt`, `.md`, `.csv` are read as UTF-8, unchanged
//! - `.pdf`, `.docx`, `.pptx` are recognized but not parsed yet; a fixed
//!   placeholder text stands in for their content
//! - everything else yields a fixed "unsupported" text

use crate::errors::IngestionError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Extensions read verbatim as UTF-8
pub const TEXT_EXTENSIONS: &[&str] = &[".txt", ".md", ".csv"];

/// Extensions recognized but not parsed
pub const BINARY_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".pptx"];

/// How the text of an [`ExtractedText`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    /// File content read as text
    Text,
    /// Known binary format without an extractor; text is a placeholder
    Placeholder,
    /// Unknown format; text is a fixed notice
    Unsupported,
}

/// Basic facts about the extracted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub filename: String,
    /// Lowercased, with the leading dot; empty when the file has none
    pub extension: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub metadata: FileMetadata,
    pub kind: ExtractionKind,
}

/// Lowercased extension including the leading dot
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Placeholder text indexed for recognized binary formats
pub fn placeholder_text(extension: &str) -> String {
    format!("This is a placeholder for {} document processing", extension)
}

/// Notice indexed for unknown formats
pub fn unsupported_text(extension: &str) -> String {
    format!("Unsupported file type: {}", extension)
}

/// Extract the text content of a file
pub async fn extract_text(path: &Path) -> Result<ExtractedText, IngestionError> {
    let size_bytes = tokio::fs::metadata(path)
        .await
        .map_err(|e| IngestionError::io(path, e))?
        .len();

    let extension = normalized_extension(path);
    let metadata = FileMetadata {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: extension.clone(),
        size_bytes,
    };

    let (text, kind) = if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestionError::io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| IngestionError::Decode {
            path: path.display().to_string(),
            message: e.utf8_error().to_string(),
        })?;
        (text, ExtractionKind::Text)
    } else if BINARY_EXTENSIONS.contains(&extension.as_str()) {
        (placeholder_text(&extension), ExtractionKind::Placeholder)
    } else {
        (unsupported_text(&extension), ExtractionKind::Unsupported)
    };

    debug!(
        path = %path.display(),
        extension = %extension,
        size_bytes,
        kind = ?kind,
        text_len = text.len(),
        "Text extracted"
    );

    Ok(ExtractedText { text, metadata, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_text_formats_are_returned_unchanged() {
        let dir = tempdir().unwrap();
        let content = "line one\r\nline two\n\u{feff}ünïcödé, with,commas\n";

        for name in ["notes.txt", "README.md", "table.csv"] {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();

            let extracted = extract_text(&path).await.unwrap();
            assert_eq!(extracted.text, content);
            assert_eq!(extracted.kind, ExtractionKind::Text);
            assert_eq!(extracted.metadata.filename, name);
            assert_eq!(
                extracted.metadata.size_bytes,
                std::fs::metadata(&path).unwrap().len()
            );
        }
    }

    #[tokio::test]
    async fn test_extension_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOTES.TXT");
        std::fs::write(&path, "hello world").unwrap();

        let extracted = extract_text(&path).await.unwrap();
        assert_eq!(extracted.text, "hello world");
        assert_eq!(extracted.metadata.extension, ".txt");
    }

    #[tokio::test]
    async fn test_binary_formats_get_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        // Not valid UTF-8 and not a real PDF: content must never be decoded
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x25]).unwrap();

        let extracted = extract_text(&path).await.unwrap();
        assert_eq!(extracted.text, "This is a placeholder for .pdf document processing");
        assert_eq!(extracted.kind, ExtractionKind::Placeholder);
        assert_eq!(extracted.metadata.size_bytes, 4);

        for (name, ext) in [("deck.PPTX", ".pptx"), ("letter.docx", ".docx")] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"PK").unwrap();
            let extracted = extract_text(&path).await.unwrap();
            assert_eq!(extracted.text, placeholder_text(ext));
        }
    }

    #[tokio::test]
    async fn test_unknown_formats_are_unsupported() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("image.png");
        std::fs::write(&path, [0x89, 0x50]).unwrap();
        let extracted = extract_text(&path).await.unwrap();
        assert_eq!(extracted.text, "Unsupported file type: .png");
        assert_eq!(extracted.kind, ExtractionKind::Unsupported);

        let path = dir.path().join("Makefile");
        std::fs::write(&path, "all:").unwrap();
        let extracted = extract_text(&path).await.unwrap();
        assert_eq!(extracted.text, "Unsupported file type: ");
        assert_eq!(extracted.metadata.extension, "");
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, [b'o', b'k', 0xc3, 0x28]).unwrap();

        let err = extract_text(&path).await.unwrap_err();
        assert!(matches!(err, IngestionError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = extract_text(&dir.path().join("nope.txt")).await.unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }
}
