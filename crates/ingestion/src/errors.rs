//! Ingestion error types

use docindex_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid UTF-8 in {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Chunking error: {0}")]
    Chunking(String),
}

impl IngestionError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return IngestionError::FileNotFound(path.display().to_string());
        }
        IngestionError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::Decode { path, message } => AppError::Decode { path, message },
            IngestionError::FileNotFound(path) => AppError::Extraction {
                message: "file not found".to_string(),
                path,
            },
            IngestionError::Io { path, source } => AppError::Extraction {
                path,
                message: source.to_string(),
            },
            IngestionError::Chunking(message) => AppError::Internal { message },
        }
    }
}
