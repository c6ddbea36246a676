//! Index service
//!
//! Owns the vector store client, the embedder, the answer synthesizer and the
//! document metadata store, and exposes the operations the HTTP layer needs:
//! initialize, insert, query and list.

use chrono::Utc;
use docindex_common::{
    config::AppConfig,
    context::{SynthesisContext, Synthesizer},
    embeddings::{create_embedder, Embedder},
    errors::Result,
    store::{text_preview, DocumentRecord, DocumentSummary, MetadataStore},
    vector::{self, ChunkPayload, IndexedChunk, VectorStore},
};
use docindex_ingestion::{ChunkingConfig, DocumentProcessor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Answer to a query together with the chunks it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub text: String,
    pub sources: Vec<SourceNode>,
}

/// A retrieved chunk cited by a query answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceNode {
    pub text: String,
    pub doc_id: String,
    pub score: f32,
}

/// What the index currently holds
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub collection: String,
    pub initialized: bool,
    /// Documents recorded in the metadata store
    pub documents: usize,
}

/// The collection the service reads from and writes to
#[derive(Debug, Clone)]
struct IndexBinding {
    collection: String,
}

pub struct IndexService {
    config: Arc<AppConfig>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    processor: DocumentProcessor,
    /// Locked only to read records or to record-and-save
    metadata: Mutex<MetadataStore>,
    /// Serializes vector store writes so one document's delete and upsert
    /// never interleave with another upload of the same ID
    writes: Mutex<()>,
    binding: RwLock<Option<IndexBinding>>,
}

impl IndexService {
    /// Build the service from configuration and load the metadata file
    pub async fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let store = vector::connect(&config)?;
        let embedder = create_embedder(&config.embedding)?;
        Self::with_components(config, store, embedder).await
    }

    pub async fn with_components(
        config: Arc<AppConfig>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let synthesizer = Synthesizer::new(config.llm.clone())?;
        let processor = DocumentProcessor::new(ChunkingConfig::from(&config.index));
        let metadata = MetadataStore::load(&config.index.metadata_path).await;

        info!(
            backend = store.backend(),
            embedding_model = embedder.model_name(),
            documents = metadata.len(),
            "Index service created"
        );

        Ok(Self {
            config,
            store,
            embedder,
            synthesizer,
            processor,
            metadata: Mutex::new(metadata),
            writes: Mutex::new(()),
            binding: RwLock::new(None),
        })
    }

    /// Bind the configured collection. Calling it again re-binds.
    pub async fn initialize(&self) -> Result<()> {
        let binding = IndexBinding {
            collection: self.config.vector_store.collection.clone(),
        };
        info!(
            backend = self.store.backend(),
            collection = %binding.collection,
            "Index initialized"
        );
        *self.binding.write().await = Some(binding);
        Ok(())
    }

    async fn bound(&self) -> Result<IndexBinding> {
        if let Some(binding) = self.binding.read().await.clone() {
            return Ok(binding);
        }
        self.initialize().await?;
        Ok(IndexBinding {
            collection: self.config.vector_store.collection.clone(),
        })
    }

    /// Extract, chunk, embed and store the file at `path` under `filename`.
    /// Returns the document ID, which is the filename.
    #[instrument(skip(self, path), fields(doc_id = %filename))]
    pub async fn insert(&self, path: &Path, filename: &str) -> Result<String> {
        let start = Instant::now();
        let binding = self.bound().await?;

        let processed = self.processor.process(path).await?;
        let doc_id = filename.to_string();

        if self
            .is_unchanged(&binding.collection, &doc_id, &processed.content_hash)
            .await?
        {
            info!("Content unchanged and still indexed, skipping re-index");
            metrics::counter!("docindex_documents_unchanged_total").increment(1);
            return Ok(doc_id);
        }

        let texts: Vec<String> = processed.chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).await?
        };

        let dimension = embeddings
            .first()
            .map(Vec::len)
            .unwrap_or_else(|| self.embedder.dimension());

        let source = path.display().to_string();
        let chunks: Vec<IndexedChunk> = processed
            .chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: Uuid::new_v4().to_string(),
                doc_id: doc_id.clone(),
                embedding,
                payload: ChunkPayload {
                    text: chunk.content.clone(),
                    doc_id: doc_id.clone(),
                    filename: filename.to_string(),
                    source: source.clone(),
                    chunk_index: chunk.index,
                },
            })
            .collect();

        let record = DocumentRecord {
            filename: filename.to_string(),
            text_preview: text_preview(&processed.extracted.text, self.config.index.preview_chars),
            node_count: chunks.len(),
            content_hash: Some(processed.content_hash),
            indexed_at: Some(Utc::now()),
        };

        let _writes = self.writes.lock().await;

        self.store.ensure_collection(&binding.collection, dimension).await?;

        // A re-upload replaces everything stored under the same ID
        self.store.delete_document(&binding.collection, &doc_id).await?;
        if !chunks.is_empty() {
            self.store.upsert(&binding.collection, &chunks).await?;
        }

        let replaced = {
            let mut metadata = self.metadata.lock().await;
            let replaced = metadata.upsert(doc_id.clone(), record).is_some();
            metadata.save().await?;
            replaced
        };

        metrics::counter!("docindex_documents_indexed_total").increment(1);
        metrics::counter!("docindex_chunks_created_total").increment(chunks.len() as u64);
        metrics::histogram!("docindex_ingestion_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            node_count = chunks.len(),
            replaced,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document indexed"
        );

        Ok(doc_id)
    }

    /// True when the recorded hash matches and the vector store still holds
    /// every chunk recorded for the document
    async fn is_unchanged(&self, collection: &str, doc_id: &str, content_hash: &str) -> Result<bool> {
        let expected = {
            let metadata = self.metadata.lock().await;
            match metadata.get(doc_id) {
                Some(record) if record.content_hash.as_deref() == Some(content_hash) => {
                    record.node_count
                }
                _ => return Ok(false),
            }
        };

        let stored = self.store.count_document(collection, doc_id).await?;
        if stored != expected {
            debug!(expected, stored, "Recorded chunks missing from the vector store");
        }
        Ok(stored == expected)
    }

    /// Retrieve the closest chunks and synthesize an answer from them
    #[instrument(skip(self))]
    pub async fn query(&self, text: &str) -> Result<QueryResponse> {
        let start = Instant::now();
        let binding = self.bound().await?;

        let embedding = self.embedder.embed(text).await?;
        let hits = self
            .store
            .search(&binding.collection, &embedding, self.config.index.similarity_top_k)
            .await?;

        debug!(hits = hits.len(), "Chunks retrieved");

        let contexts: Vec<SynthesisContext> = hits
            .iter()
            .map(|hit| SynthesisContext {
                doc_id: hit.payload.doc_id.clone(),
                content: hit.payload.text.clone(),
            })
            .collect();

        let answer = self.synthesizer.synthesize(text, &contexts).await?;

        let sources = hits
            .into_iter()
            .map(|hit| SourceNode {
                text: hit.payload.text,
                doc_id: hit.payload.doc_id,
                score: hit.score,
            })
            .collect::<Vec<_>>();

        metrics::counter!("docindex_queries_total").increment(1);
        metrics::histogram!("docindex_query_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            sources = sources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Query answered"
        );

        Ok(QueryResponse { text: answer, sources })
    }

    /// Every indexed document, in metadata store order
    pub async fn list_documents(&self) -> Vec<DocumentSummary> {
        self.metadata.lock().await.list()
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Snapshot of the index for readiness reporting
    pub async fn status(&self) -> IndexStatus {
        IndexStatus {
            collection: self.config.vector_store.collection.clone(),
            initialized: self.binding.read().await.is_some(),
            documents: self.metadata.lock().await.len(),
        }
    }

    /// Liveness of the vector store
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
