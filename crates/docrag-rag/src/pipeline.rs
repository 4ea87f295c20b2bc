//! Request pipeline: expansion → retrieval → assembly → generation.
//!
//! One request walks the stage sequence below; any stage failure
//! short-circuits to `Failed` with the stage recorded on the error. Once
//! streaming has started, faults travel in-band on the fragment channel
//! instead (a started stream is never rolled back into an error response).

use crate::expand::{expand_query, ExpansionConfig, ExpansionError};
use crate::retrieve::{retrieve, RetrievalError};
use docrag_embeddings::Embedder;
use docrag_llm::{AnswerPrompt, ChatBackend, LlmError, ModelSelector, PromptTemplate, TokenStream};
use docrag_vectors::VectorSearch;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error};

/// Sequencing states of one request.
///
/// `Streaming → Completed` is observed by the caller as the fragment channel
/// closing without a fault; the pipeline keeps no per-request state after
/// handing the channel off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Expanding,
    Retrieving,
    Assembling,
    Generating,
    Streaming,
    Completed,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Expanding => "expanding",
            Stage::Retrieving => "retrieving",
            Stage::Assembling => "assembling",
            Stage::Generating => "generating",
            Stage::Streaming => "streaming",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that end a request before streaming starts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("query expansion failed: {0}")]
    Expansion(#[from] ExpansionError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation rejected: {0}")]
    Generation(LlmError),

    #[error("{stage} stage exceeded its {budget_secs}s budget")]
    StageTimeout { stage: Stage, budget_secs: u64 },
}

/// Pipeline tuning knobs, built once at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Nearest passages fetched per variant.
    pub top_k: usize,
    /// Query expansion settings.
    pub expansion: ExpansionConfig,
    /// Budget for each of the expanding and retrieving stages, in seconds.
    pub stage_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 30,
            expansion: ExpansionConfig::default(),
            stage_timeout_secs: 60,
        }
    }
}

/// Maps a model selector to its configured backend.
///
/// The set of backends is fixed at startup; a selector whose backend was
/// not configured (e.g. missing API key) is a configuration failure at
/// request time, before any network call.
pub struct BackendRegistry {
    local_small: Arc<dyn ChatBackend>,
    hosted_large: Option<Arc<dyn ChatBackend>>,
}

impl BackendRegistry {
    /// Create a registry with the local backend only.
    pub fn new(local_small: Arc<dyn ChatBackend>) -> Self {
        Self {
            local_small,
            hosted_large: None,
        }
    }

    /// Register the hosted backend.
    pub fn with_hosted_large(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.hosted_large = Some(backend);
        self
    }

    /// Resolve a selector to its backend.
    pub fn resolve(&self, selector: ModelSelector) -> Result<Arc<dyn ChatBackend>, PipelineError> {
        match selector {
            ModelSelector::LocalSmall => Ok(self.local_small.clone()),
            ModelSelector::HostedLarge => self.hosted_large.clone().ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "backend for '{}' is not configured",
                    selector
                ))
            }),
        }
    }
}

/// The retrieval-augmented generation pipeline.
///
/// Holds only long-lived clients; every request's intermediate state
/// (variants, context, prompt) is local to one `run` call and dropped when
/// the returned stream ends.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorSearch>,
    backends: BackendRegistry,
    config: PipelineConfig,
}

impl RagPipeline {
    /// Create a pipeline over the given clients.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorSearch>,
        backends: BackendRegistry,
    ) -> Self {
        Self::with_config(embedder, store, backends, PipelineConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorSearch>,
        backends: BackendRegistry,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            backends,
            config,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// On success the caller receives the fragment channel; relaying,
    /// cancellation (by dropping the channel) and fault observation are the
    /// caller's side of the contract from that point on.
    pub async fn run(&self, query: &str, model: &str) -> Result<TokenStream, PipelineError> {
        debug!(stage = %Stage::Received, query, model, "chat request accepted");

        let selector = ModelSelector::parse(model)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let backend = self.backends.resolve(selector)?;
        let budget = Duration::from_secs(self.config.stage_timeout_secs);

        debug!(stage = %Stage::Expanding, backend = backend.name(), "expanding query");
        let variants = match timeout(
            budget,
            expand_query(backend.as_ref(), query, &self.config.expansion),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(self.stage_timeout(Stage::Expanding)),
        };

        debug!(stage = %Stage::Retrieving, variants = variants.len(), "retrieving context");
        let context = match timeout(
            budget,
            retrieve(
                self.embedder.as_ref(),
                self.store.as_ref(),
                &variants,
                self.config.top_k,
            ),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(self.stage_timeout(Stage::Retrieving)),
        };

        debug!(stage = %Stage::Assembling, passages = context.len(), "assembling prompt");
        let prompt = AnswerPrompt::new(query, context.as_text()).generate();

        debug!(stage = %Stage::Generating, "starting generation");
        let stream = backend
            .stream(&prompt)
            .await
            .map_err(PipelineError::Generation)?;

        debug!(stage = %Stage::Streaming, "relaying fragments to caller");
        Ok(stream)
    }

    fn stage_timeout(&self, stage: Stage) -> PipelineError {
        let budget_secs = self.config.stage_timeout_secs;
        error!(stage = %stage, budget_secs, "stage exceeded its budget");
        PipelineError::StageTimeout { stage, budget_secs }
    }
}
