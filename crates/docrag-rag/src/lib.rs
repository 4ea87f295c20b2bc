//! # docrag RAG
//!
//! Retrieval-augmented generation pipeline for docrag.
//!
//! One request flows through query expansion, concurrent per-variant
//! retrieval, context deduplication, prompt assembly and streaming
//! generation. All intermediate state is request-local; the crate holds
//! only long-lived clients.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_rag::{BackendRegistry, RagPipeline};
//! use std::sync::Arc;
//!
//! let pipeline = RagPipeline::new(embedder, store, BackendRegistry::new(local));
//! let mut stream = pipeline.run("what is cmd in golang", "local-small-model").await?;
//! while let Some(fragment) = stream.recv().await {
//!     print!("{}", fragment?);
//! }
//! ```

mod expand;
mod pipeline;
mod retrieve;

pub use expand::{expand_query, ExpansionConfig, ExpansionError};
pub use pipeline::{BackendRegistry, PipelineConfig, PipelineError, RagPipeline, Stage};
pub use retrieve::{retrieve, ContextBlock, RetrievalError};
