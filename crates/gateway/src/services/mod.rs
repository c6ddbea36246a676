//! Services shared by the request handlers

pub mod index;

pub use index::{IndexService, IndexStatus, QueryResponse, SourceNode};
