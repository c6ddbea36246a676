//! Document upload handler
//!
//! Accepts a multipart form with a `file` field, stores the bytes in a
//! per-request directory under the upload directory, indexes the copy and
//! removes the directory again whatever the outcome.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::AppState;
use docindex_common::errors::{AppError, Result};

const FILE_FIELD: &str = "file";
const NO_FILE_PART: &str = "No file part";
const NO_SELECTED_FILE: &str = "No selected file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub doc_id: String,
}

/// Upload a document and index it
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Request is not a multipart form");
        AppError::missing(FILE_FIELD, NO_FILE_PART)
    })?;

    let (raw_name, data) = read_file_field(&mut multipart).await?;
    let filename = sanitize_filename(&raw_name).ok_or_else(|| AppError::Validation {
        message: format!("Invalid filename: {}", raw_name),
        field: Some(FILE_FIELD.to_string()),
    })?;

    info!(filename = %filename, size_bytes = data.len(), "Upload received");

    let upload_dir = &state.config.index.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;
    let workdir = tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(upload_dir)?;

    let result = index_upload(&state, workdir.path(), &filename, &data).await;

    let workdir_path = workdir.path().display().to_string();
    if let Err(e) = workdir.close() {
        debug!(path = %workdir_path, error = %e, "Failed to remove upload directory");
    }

    let doc_id = result?;
    Ok(Json(UploadResponse {
        message: "File uploaded and indexed successfully".to_string(),
        doc_id,
    }))
}

async fn index_upload(state: &AppState, dir: &Path, filename: &str, data: &[u8]) -> Result<String> {
    let path = dir.join(filename);
    tokio::fs::write(&path, data).await?;
    state.index.insert(&path, filename).await
}

/// First `file` field that carries a filename, with its bytes
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("Invalid multipart body: {}", e),
        field: None,
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if name.is_empty() {
            return Err(AppError::missing(FILE_FIELD, NO_SELECTED_FILE));
        }

        let data = field.bytes().await.map_err(|e| AppError::Validation {
            message: format!("Failed to read file: {}", e),
            field: Some(FILE_FIELD.to_string()),
        })?;
        return Ok((name, data));
    }

    Err(AppError::missing(FILE_FIELD, NO_FILE_PART))
}

static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static DISALLOWED: OnceLock<Regex> = OnceLock::new();

/// Reduce a client-supplied filename to a safe single path component.
///
/// Directories are dropped, whitespace runs become `_`, characters outside
/// `[A-Za-z0-9_.-]` are removed and leading or trailing dots and underscores
/// are stripped. Returns `None` when nothing is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    let disallowed = DISALLOWED.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let spaced = whitespace.replace_all(base.trim(), "_");
    let cleaned = disallowed.replace_all(&spaced, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
