//! Application state for the web server.

use docrag_rag::RagPipeline;
use std::sync::Arc;

/// Shared application state.
///
/// Only long-lived clients live here; per-request state stays inside one
/// pipeline run.
#[derive(Clone)]
pub struct AppState {
    /// The RAG pipeline serving chat requests.
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(pipeline: RagPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
