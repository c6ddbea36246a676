//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::IndexStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness report: vector store reachability plus what the index holds
#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub index: IndexStatus,
    pub checks: ReadyChecks,
}

#[derive(Serialize)]
pub struct ReadyChecks {
    pub vector_store: VectorStoreCheck,
}

#[derive(Serialize)]
pub struct VectorStoreCheck {
    pub up: bool,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness check. Ready once the vector store answers and the collection is bound.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let start = std::time::Instant::now();
    let ping = state.index.ping().await;
    let vector_store = VectorStoreCheck {
        up: ping.is_ok(),
        backend: state.index.backend(),
        latency_ms: ping.is_ok().then(|| start.elapsed().as_millis() as u64),
        error: ping.err().map(|e| e.to_string()),
    };

    let index = state.index.status().await;
    let ready = vector_store.up && index.initialized;

    Json(ReadyResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        index,
        checks: ReadyChecks { vector_store },
    })
}
