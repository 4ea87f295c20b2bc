//! # docrag Vectors
//!
//! Vector store client for the docrag document index.
//!
//! This crate provides a unified interface for nearest-neighbor search over
//! the scraped documentation corpus. The index itself lives in an external
//! service; only the search contract is modeled here.
//!
//! ## Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | In-Memory | Brute-force cosine search, good for testing |
//! | Chroma | HTTP adapter for a remote Chroma server |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docrag_vectors::{ChromaStore, VectorSearch};
//!
//! let store = ChromaStore::connect("localhost", 8000, "golang_docs").await?;
//! let hits = store.search(&query_vector, 30).await?;
//! for hit in hits {
//!     println!("{}", hit.content);
//! }
//! ```

pub mod chroma;
pub mod memory;

pub use chroma::ChromaStore;
pub use memory::{InMemoryStore, MemoryRecord};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A passage returned from the document index.
///
/// Relevance rank is the position within the returned slice; results are
/// ordered most-similar first.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHit {
    /// The passage text.
    pub content: String,
    /// Source identifier (the URL the passage was scraped from), if stored.
    pub source: Option<String>,
}

impl DocumentHit {
    /// Create a hit with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
        }
    }

    /// Attach a source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Abstract interface for similarity search over the document index.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the collection this store searches.
    fn collection(&self) -> &str;

    /// Return the top `k` passages nearest to `vector`, most similar first.
    async fn search(&self, vector: &[f32], k: usize) -> StoreResult<Vec<DocumentHit>>;
}
