//! Vector store abstraction
//!
//! Two backends implement [`VectorStore`]:
//! - [`QdrantStore`] talks to a Qdrant server over its REST API
//! - [`InMemoryStore`] keeps everything in process (development, tests)

mod memory;
mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

use crate::config::{AppConfig, VectorBackend};
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A chunk ready to be written to the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    /// Point ID
    pub id: String,

    /// Document the chunk was cut from
    pub doc_id: String,

    pub embedding: Vec<f32>,

    /// Stored alongside the vector
    pub payload: ChunkPayload,
}

/// Payload persisted with every point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub chunk_index: usize,
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub id: String,
    pub payload: ChunkPayload,
    /// Higher is more similar
    pub score: f32,
}

/// Storage backend for embedded chunks with similarity search
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name used in logs and errors
    fn backend(&self) -> &'static str;

    /// Create the collection if it does not exist yet
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    /// Insert or replace points
    async fn upsert(&self, collection: &str, chunks: &[IndexedChunk]) -> Result<()>;

    /// Remove every point belonging to a document. Missing collection is not an error.
    async fn delete_document(&self, collection: &str, doc_id: &str) -> Result<()>;

    /// Number of points stored for a document (0 when the collection is missing)
    async fn count_document(&self, collection: &str, doc_id: &str) -> Result<usize>;

    /// Search for the `top_k` most similar chunks.
    ///
    /// Returns results ordered by descending score; a missing collection yields no results.
    async fn search(&self, collection: &str, embedding: &[f32], top_k: usize)
        -> Result<Vec<ScoredChunk>>;

    /// Liveness of the backend
    async fn ping(&self) -> Result<()>;
}

/// Build the vector store client selected in configuration
pub fn connect(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    match config.vector_store.backend {
        VectorBackend::Qdrant => {
            tracing::info!(url = %config.qdrant_url(), "Using Qdrant vector store");
            Ok(Arc::new(QdrantStore::new(
                &config.qdrant_url(),
                config.vector_store.api_key.clone(),
                config.vector_store.timeout_secs,
            )?))
        }
        VectorBackend::Memory => {
            tracing::warn!("Using in-memory vector store, indexed chunks are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
