//! DocIndex Common Library
//!
//! Shared code for the DocIndex crates including:
//! - Configuration management
//! - Error types and handling
//! - Embedding client abstraction
//! - Answer synthesis (LLM)
//! - Vector store abstraction (Qdrant, in-memory)
//! - Document metadata store
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod store;
pub mod vector;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use store::{DocumentRecord, MetadataStore};
pub use vector::VectorStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Qdrant collection holding document chunks
pub const DEFAULT_COLLECTION: &str = "document_collection";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
