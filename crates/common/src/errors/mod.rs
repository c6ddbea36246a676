//! Error types for DocIndex services
//!
//! Provides the error handling system shared by every crate:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping (input problems are 400, everything else 500)
//! - Structured `{"error": ...}` JSON responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    ValidationError,
    MissingField,

    // Document errors
    ExtractionError,
    DecodeError,

    // External service errors
    VectorStoreError,
    EmbeddingError,
    SynthesisError,

    // Internal errors
    InternalError,
    ConfigurationError,
    SerializationError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{message}")]
    MissingField { field: String, message: String },

    // Document errors
    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Invalid UTF-8 in {path}: {message}")]
    Decode { path: String, message: String },

    // External service errors
    #[error("Vector store error ({backend}): {message}")]
    VectorStore { backend: String, message: String },

    #[error("Embedding service error: {message}")]
    EmbeddingError { message: String },

    #[error("Answer synthesis error: {message}")]
    Synthesis { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Shorthand for a missing request field
    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::MissingField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a vector store failure
    pub fn vector_store(backend: &str, message: impl Into<String>) -> Self {
        AppError::VectorStore {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::Extraction { .. } => ErrorCode::ExtractionError,
            AppError::Decode { .. } => ErrorCode::DecodeError,
            AppError::VectorStore { .. } => ErrorCode::VectorStoreError,
            AppError::EmbeddingError { .. } => ErrorCode::EmbeddingError,
            AppError::Synthesis { .. } => ErrorCode::SynthesisError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingField { .. } => StatusCode::BAD_REQUEST,

            // Everything past request validation is reported as a server failure
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
            metrics::counter!("docindex_errors_total", "kind" => "server").increment(1);
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
            metrics::counter!("docindex_errors_total", "kind" => "client").increment(1);
        }

        let body = ErrorResponse {
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_bad_request() {
        let err = AppError::missing("file", "No file part");
        assert_eq!(err.code(), ErrorCode::MissingField);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No file part");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "No selected file".into(),
            field: Some("file".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_upstream_failures_are_server_errors() {
        let errors = [
            AppError::vector_store("qdrant", "connection refused"),
            AppError::EmbeddingError { message: "quota".into() },
            AppError::Synthesis { message: "timeout".into() },
            AppError::Decode { path: "a.txt".into(), message: "bad byte".into() },
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(err.is_server_error());
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_error_code_serializes_screaming_snake_case() {
        let body = ErrorResponse {
            error: "No file part".into(),
            code: ErrorCode::MissingField,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "No file part", "code": "MISSING_FIELD"})
        );
    }
}
