//! Document listing handler

use axum::{extract::State, Json};
use docindex_common::store::DocumentSummary;

use crate::AppState;

/// List every indexed document with its preview
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    Json(state.index.list_documents().await)
}
