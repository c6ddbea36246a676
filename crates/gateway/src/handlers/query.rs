//! Query handler

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::services::QueryResponse;
use crate::AppState;
use docindex_common::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub text: Option<String>,
}

/// Answer a natural-language question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>> {
    let text = params
        .text
        .ok_or_else(|| AppError::missing("text", "No text parameter provided"))?;

    let response = state.index.query(&text).await?;
    Ok(Json(response))
}
