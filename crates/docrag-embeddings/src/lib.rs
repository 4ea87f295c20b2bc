//! # docrag Embeddings
//!
//! Embedding client for docrag semantic retrieval.
//!
//! Query variants are converted into fixed-length vectors here before being
//! matched against the document index. The embedding model itself runs
//! behind a remote service; this crate only speaks its request/response
//! contract.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_embeddings::{Embedder, OllamaEmbedder};
//!
//! let embedder = OllamaEmbedder::new("http://localhost:11434");
//! let vector = embedder.embed("what is cmd in golang").await?;
//! ```

mod embedder;
mod ollama;

pub use embedder::{Embedder, EmbeddingError, EmbeddingResult, MockEmbedder};
pub use ollama::{EmbeddingConfig, OllamaEmbedder};
