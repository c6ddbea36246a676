//! Document metadata store
//!
//! A small ordered map from document ID to [`DocumentRecord`], mirrored to a
//! single JSON object file. Loading is best-effort: a missing or unreadable
//! file yields an empty store. Saving replaces the file through a sibling
//! temp file and a rename so a crash mid-write leaves the previous version.

use crate::errors::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker appended to truncated previews
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Metadata kept for every indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,

    pub text_preview: String,

    /// Number of chunks written to the vector store
    pub node_count: usize,

    /// Hex SHA-256 of the extracted text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Listing entry returned by the documents endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub text_preview: String,
}

/// Build a preview of at most `max_chars` characters, marking truncation
pub fn text_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], PREVIEW_ELLIPSIS),
        None => text.to_string(),
    }
}

/// The metadata map together with the file it is persisted to
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    entries: IndexMap<String, DocumentRecord>,
}

impl MetadataStore {
    /// Empty store bound to `path`, nothing is read
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: IndexMap::new(),
        }
    }

    /// Load the store from `path`, falling back to an empty map on any failure
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<IndexMap<String, DocumentRecord>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable metadata file");
                    IndexMap::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No metadata file, starting empty");
                IndexMap::new()
            }
        };

        debug!(path = %path.display(), documents = entries.len(), "Metadata store loaded");
        Self { path, entries }
    }

    /// Serialize the whole map and atomically replace the file
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec(&self.entries)?;
        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), documents = self.entries.len(), "Metadata store saved");
        Ok(())
    }

    /// Insert or overwrite a record. A replaced ID keeps its original position.
    pub fn upsert(&mut self, id: impl Into<String>, record: DocumentRecord) -> Option<DocumentRecord> {
        self.entries.insert(id.into(), record)
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.entries.get(id)
    }

    /// All documents projected for listing, in store order
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.entries
            .iter()
            .map(|(id, record)| DocumentSummary {
                id: id.clone(),
                filename: record.filename.clone(),
                text_preview: record.text_preview.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &IndexMap<String, DocumentRecord> {
        &self.entries
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
