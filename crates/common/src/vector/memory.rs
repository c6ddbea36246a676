//! In-memory vector store using cosine similarity.

use super::{IndexedChunk, ScoredChunk, VectorStore};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Collection {
    dimension: usize,
    points: IndexMap<String, IndexedChunk>,
}

/// Collections keyed by name, points keyed by ID in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in a collection (0 when absent)
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection { dimension, points: IndexMap::new() });
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[IndexedChunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| {
            AppError::vector_store(self.backend(), format!("collection '{collection}' does not exist"))
        })?;

        for chunk in chunks {
            if chunk.embedding.len() != store.dimension {
                return Err(AppError::vector_store(
                    self.backend(),
                    format!(
                        "dimension mismatch: expected {}, got {}",
                        store.dimension,
                        chunk.embedding.len()
                    ),
                ));
            }
            store.points.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, doc_id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(store) = collections.get_mut(collection) {
            store.points.retain(|_, chunk| chunk.doc_id != doc_id);
        }
        Ok(())
    }

    async fn count_document(&self, collection: &str, doc_id: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.points.values().filter(|chunk| chunk.doc_id == doc_id).count())
            .unwrap_or(0))
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = store
            .points
            .values()
            .map(|chunk| ScoredChunk {
                id: chunk.id.clone(),
                payload: chunk.payload.clone(),
                score: cosine_similarity(embedding, &chunk.embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ChunkPayload;

    fn chunk(id: &str, doc_id: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: id.to_string(),
            doc_id: doc_id.to_string(),
            embedding,
            payload: ChunkPayload {
                text: format!("text of {id}"),
                doc_id: doc_id.to_string(),
                filename: doc_id.to_string(),
                source: String::new(),
                chunk_index: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let store = InMemoryStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        store
            .upsert(
                "docs",
                &[
                    chunk("a", "a.txt", vec![0.0, 1.0]),
                    chunk("b", "b.txt", vec![1.0, 0.0]),
                    chunk("c", "c.txt", vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let results = store.search("docs", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "b");
        assert_eq!(results[1].id, "c");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let store = InMemoryStore::new();
        assert!(store.search("nope", &[1.0], 3).await.unwrap().is_empty());
        assert!(store.delete_document("nope", "x").await.is_ok());
        assert!(store.upsert("nope", &[chunk("a", "a", vec![1.0])]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_document() {
        let store = InMemoryStore::new();
        store.ensure_collection("docs", 1).await.unwrap();
        store
            .upsert(
                "docs",
                &[chunk("a1", "a.txt", vec![1.0]), chunk("a2", "a.txt", vec![1.0]), chunk("b1", "b.txt", vec![1.0])],
            )
            .await
            .unwrap();

        assert_eq!(store.count_document("docs", "a.txt").await.unwrap(), 2);

        store.delete_document("docs", "a.txt").await.unwrap();
        assert_eq!(store.len("docs").await, 1);
        assert_eq!(store.count_document("docs", "a.txt").await.unwrap(), 0);
        assert_eq!(store.count_document("missing", "a.txt").await.unwrap(), 0);
        let results = store.search("docs", &[1.0], 3).await.unwrap();
        assert_eq!(results[0].payload.doc_id, "b.txt");
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = InMemoryStore::new();
        store.ensure_collection("docs", 3).await.unwrap();
        let err = store.upsert("docs", &[chunk("a", "a", vec![1.0])]).await.unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
