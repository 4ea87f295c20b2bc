//! Core chat backend trait and model selection.

use thiserror::Error;
use tokio::sync::mpsc;

/// LLM-related errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Timeout after {0} seconds")]
    Timeout(u32),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Unknown model selector: {0}")]
    UnknownModel(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Incremental output of one generation attempt.
///
/// Fragments arrive in order. A transport fault after the stream has started
/// is delivered as a terminal `Err` item; the channel closing without one
/// means the generation completed. Dropping the receiver cancels the
/// producer.
pub type TokenStream = mpsc::Receiver<LlmResult<String>>;

/// Buffered capacity of the fragment channel.
pub(crate) const STREAM_CHANNEL_CAPACITY: usize = 100;

/// Selects which generation backend serves a request.
///
/// This is a closed set: unrecognized tags fail at parse time, before any
/// network call is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSelector {
    /// Low-temperature, short-context local inference.
    LocalSmall,
    /// Higher-temperature, larger-context hosted inference.
    HostedLarge,
}

impl ModelSelector {
    /// Wire tag for the local backend.
    pub const LOCAL_SMALL_TAG: &'static str = "local-small-model";
    /// Wire tag for the hosted backend.
    pub const HOSTED_LARGE_TAG: &'static str = "hosted-large-model";

    /// Parse a wire tag.
    pub fn parse(tag: &str) -> LlmResult<Self> {
        match tag {
            Self::LOCAL_SMALL_TAG => Ok(Self::LocalSmall),
            Self::HOSTED_LARGE_TAG => Ok(Self::HostedLarge),
            other => Err(LlmError::UnknownModel(other.to_string())),
        }
    }

    /// The wire tag for this selector.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LocalSmall => Self::LOCAL_SMALL_TAG,
            Self::HostedLarge => Self::HOSTED_LARGE_TAG,
        }
    }
}

impl std::fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ModelSelector {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Configuration for chat requests.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model name/identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Context window in tokens, where the backend accepts one.
    pub context_window: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u32,
}

impl ChatConfig {
    /// Create config for the local small model.
    pub fn local_small() -> Self {
        Self {
            model: "deepseek-r1:1.5b".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            top_p: 0.9,
            top_k: 40,
            context_window: Some(8500),
            timeout_secs: 120, // Local models can be slower
        }
    }

    /// Create config for the hosted large model.
    pub fn hosted_large() -> Self {
        Self {
            model: "gemini-2.0-flash-thinking-exp-01-21".to_string(),
            max_tokens: 8500,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 80,
            context_window: None,
            timeout_secs: 120,
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Core trait for chat backends.
///
/// Implementors provide one-shot completion (used by query expansion) and
/// streaming generation over various providers.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Get the current configuration.
    fn config(&self) -> &ChatConfig;

    /// Generate a completion for a prompt, returned whole.
    async fn complete(&self, prompt: &str) -> LlmResult<String>;

    /// Start a streaming generation for a prompt.
    ///
    /// Returns an error if the backend rejects the request before producing
    /// any fragment. The returned stream represents exactly one attempt; it
    /// is finite and not restartable, and no retry happens internally.
    async fn stream(&self, prompt: &str) -> LlmResult<TokenStream>;

    /// Check if the backend is available.
    async fn health_check(&self) -> LlmResult<bool> {
        match self.complete("ping").await {
            Ok(_) => Ok(true),
            Err(e) => match e {
                LlmError::ConnectionFailed(_) => Ok(false),
                LlmError::AuthenticationFailed => Ok(false),
                _ => Ok(true),
            },
        }
    }
}
