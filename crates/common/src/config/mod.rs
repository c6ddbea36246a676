//! Configuration management for DocIndex services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Legacy variables (QDRANT_HOST, QDRANT_PORT, OPENAI_API_KEY)
//! - Configuration files (config/default, config/<APP_ENV>, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector database configuration
    pub vector_store: VectorStoreConfig,

    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// Answer synthesis (LLM) configuration
    pub llm: LlmConfig,

    /// Chunking, retrieval and local persistence
    pub index: IndexConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
}

/// Which vector store implementation backs the index
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Qdrant over its REST API
    Qdrant,
    /// Process-local store, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,

    /// Qdrant host
    pub host: String,

    /// Qdrant REST port
    pub port: u16,

    /// Collection holding document chunks
    pub collection: String,

    /// Optional API key sent as `api-key`
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai, mock
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    pub model: String,

    /// Embedding dimension (mock provider, and unknown OpenAI models)
    pub dimension: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum attempts per embedding request
    pub max_retries: u32,

    /// Batch size for embedding requests
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; when unset answers are composed offline from the retrieved text
    pub api_key: Option<String>,

    /// API base URL (OpenAI compatible)
    pub api_base: String,

    /// Chat model
    pub model: String,

    pub temperature: f32,

    /// Maximum output tokens
    pub max_tokens: usize,

    /// Character budget for the context packed into one prompt
    pub context_window_chars: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Chunk capacity in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    pub similarity_top_k: usize,

    /// Characters kept in a document's text preview
    pub preview_chars: usize,

    /// JSON file holding the document metadata map
    pub metadata_path: PathBuf,

    /// Directory for temporary upload copies
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (debug, info, warn, error or an EnvFilter string)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    pub metrics_port: u16,

    /// Service name attached to logs
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5601 }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_qdrant_host() -> String { "localhost".to_string() }
fn default_qdrant_port() -> u16 { 6333 }
fn default_collection() -> String { crate::DEFAULT_COLLECTION.to_string() }
fn default_vector_timeout() -> u64 { 30 }
fn default_embedding_provider() -> String { "openai".to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { 1536 }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_batch_size() -> usize { 100 }
fn default_llm_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_llm_temperature() -> f32 { 0.1 }
fn default_llm_max_tokens() -> usize { 512 }
fn default_context_window() -> usize { 12_000 }
fn default_llm_timeout() -> u64 { 60 }
fn default_chunk_size() -> usize { 1024 }
fn default_chunk_overlap() -> usize { 100 }
fn default_top_k() -> usize { 3 }
fn default_preview_chars() -> usize { 200 }
fn default_metadata_path() -> PathBuf { PathBuf::from("documents_metadata.json") }
fn default_upload_dir() -> PathBuf { PathBuf::from("temp_documents") }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "docindex".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Qdrant,
            host: default_qdrant_host(),
            port: default_qdrant_port(),
            collection: default_collection(),
            api_key: None,
            timeout_secs: default_vector_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_llm_base(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            context_window_chars: default_context_window(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            similarity_top_k: default_top_k(),
            preview_chars: default_preview_chars(),
            metadata_path: default_metadata_path(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__VECTOR_STORE__PORT=6333
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            );

        Self::with_legacy_overrides(builder)?
            .build()?
            .try_deserialize()
    }

    /// Apply the unprefixed variables the service has always honored
    fn with_legacy_overrides(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let qdrant_port = match std::env::var("QDRANT_PORT") {
            Ok(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::Message(format!("invalid QDRANT_PORT '{}': {}", raw, e))
            })?),
            Err(_) => None,
        };
        let openai_key = std::env::var("OPENAI_API_KEY").ok();

        builder
            .set_override_option("vector_store.host", std::env::var("QDRANT_HOST").ok())?
            .set_override_option("vector_store.port", qdrant_port.map(i64::from))?
            .set_override_option("embedding.api_key", openai_key.clone())?
            .set_override_option("llm.api_key", openai_key)
    }

    /// Base URL of the Qdrant REST API
    pub fn qdrant_url(&self) -> String {
        format!("http://{}:{}", self.vector_store.host, self.vector_store.port)
    }
}
