//! DocIndex Ingestion
//!
//! Turns uploaded files into indexable text:
//! 1. Extracts plain text by file extension
//! 2. Hashes the extracted text
//! 3. Splits it into overlapping chunks for embedding

pub mod chunker;
pub mod errors;
pub mod extract;
pub mod processor;

pub use chunker::{ChunkingConfig, TextChunk, TextFormat};
pub use errors::IngestionError;
pub use extract::{extract_text, ExtractedText, ExtractionKind, FileMetadata};
pub use processor::{DocumentProcessor, ProcessedDocument};
