//! Qdrant vector store backend.
//!
//! Speaks the Qdrant REST API (port 6333 by default) with `reqwest`.
//! Collections use cosine distance; chunk metadata is stored as point payload
//! and `doc_id` gets a keyword payload index so per-document deletes stay cheap.

use super::{ChunkPayload, IndexedChunk, ScoredChunk, VectorStore};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const BACKEND: &str = "qdrant";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct Point<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: &'a ChunkPayload,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<ChunkPayload>,
}

impl QdrantStore {
    /// Create a client for the Qdrant REST API at `base_url` (e.g. `http://localhost:6333`)
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    fn map_err(e: reqwest::Error) -> AppError {
        AppError::vector_store(BACKEND, e.to_string())
    }

    /// Turn a non-success response into an error carrying Qdrant's message
    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::vector_store(
            BACKEND,
            format!("{} failed with {}: {}", action, status, body),
        ))
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let response = self
            .request(Method::GET, &format!("/collections/{}", collection))
            .send()
            .await
            .map_err(Self::map_err)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => Self::check(response, "collection lookup").await.map(|_| true),
        }
    }
}

/// Qdrant returns point IDs as either UUID strings or unsigned integers
fn point_id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn into_scored(point: ScoredPoint) -> ScoredChunk {
    ScoredChunk {
        id: point_id_to_string(&point.id),
        payload: point.payload.unwrap_or_default(),
        score: point.score,
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        if self.collection_exists(collection).await? {
            debug!(collection, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        let response = self
            .request(Method::PUT, &format!("/collections/{}", collection))
            .json(&json!({ "vectors": { "size": dimension, "distance": "Cosine" } }))
            .send()
            .await
            .map_err(Self::map_err)?;

        // Lost a creation race with a concurrent request
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        Self::check(response, "collection creation").await?;

        let response = self
            .request(Method::PUT, &format!("/collections/{}/index?wait=true", collection))
            .json(&json!({ "field_name": "doc_id", "field_schema": "keyword" }))
            .send()
            .await
            .map_err(Self::map_err)?;
        Self::check(response, "payload index creation").await?;

        tracing::info!(collection, dimension, "Created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[IndexedChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<Point<'_>> = chunks
            .iter()
            .map(|chunk| Point {
                id: &chunk.id,
                vector: &chunk.embedding,
                payload: &chunk.payload,
            })
            .collect();

        let response = self
            .request(Method::PUT, &format!("/collections/{}/points?wait=true", collection))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(Self::map_err)?;
        Self::check(response, "upsert").await?;

        debug!(collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn delete_document(&self, collection: &str, doc_id: &str) -> Result<()> {
        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/delete?wait=true", collection),
            )
            .json(&json!({
                "filter": { "must": [ { "key": "doc_id", "match": { "value": doc_id } } ] }
            }))
            .send()
            .await
            .map_err(Self::map_err)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response, "delete").await?;

        debug!(collection, doc_id, "deleted document points from qdrant");
        Ok(())
    }

    async fn count_document(&self, collection: &str, doc_id: &str) -> Result<usize> {
        let response = self
            .request(Method::POST, &format!("/collections/{}/points/count", collection))
            .json(&json!({
                "filter": { "must": [ { "key": "doc_id", "match": { "value": doc_id } } ] },
                "exact": true
            }))
            .send()
            .await
            .map_err(Self::map_err)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }

        let parsed: CountResponse = Self::check(response, "count")
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;
        Ok(parsed.result.count)
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let response = self
            .request(Method::POST, &format!("/collections/{}/points/search", collection))
            .json(&json!({ "vector": embedding, "limit": top_k, "with_payload": true }))
            .send()
            .await
            .map_err(Self::map_err)?;

        // Nothing has been inserted yet
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = Self::check(response, "search")
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;

        Ok(parsed.result.into_iter().map(into_scored).collect())
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .request(Method::GET, "/healthz")
            .send()
            .await
            .map_err(Self::map_err)?;
        Self::check(response, "health check").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "result": [
                {"id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26", "version": 3, "score": 0.91,
                 "payload": {"text": "hello world", "doc_id": "notes.txt", "filename": "notes.txt",
                             "source": "temp_documents/notes.txt", "chunk_index": 0}},
                {"id": 42, "version": 1, "score": 0.12, "payload": {"text": "other"}}
            ],
            "status": "ok",
            "time": 0.001
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let results: Vec<ScoredChunk> = parsed.result.into_iter().map(into_scored).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
        assert_eq!(results[0].payload.doc_id, "notes.txt");
        assert_eq!(results[1].id, "42");
        assert_eq!(results[1].payload.doc_id, "");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_parse_count_response() {
        let body = r#"{"result": {"count": 7}, "status": "ok", "time": 0.001}"#;
        let parsed: CountResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.count, 7);
    }

    #[test]
    fn test_point_serialization() {
        let payload = ChunkPayload {
            text: "chunk".into(),
            doc_id: "a.md".into(),
            filename: "a.md".into(),
            source: "/tmp/a.md".into(),
            chunk_index: 2,
        };
        let point = Point { id: "p1", vector: &[0.5, 0.5], payload: &payload };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["payload"]["doc_id"], "a.md");
        assert_eq!(value["payload"]["chunk_index"], 2);
    }

    #[test]
    fn test_base_url_normalized() {
        let store = QdrantStore::new("http://localhost:6333/", None, 5).unwrap();
        assert_eq!(store.base_url, "http://localhost:6333");
    }
}
