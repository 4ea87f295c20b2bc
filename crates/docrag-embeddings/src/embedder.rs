//! Core embedding trait.

use async_trait::async_trait;
use thiserror::Error;

/// Embedding-related errors.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding backends.
///
/// Implementors convert text into a fixed-length vector suitable for
/// similarity search against the document index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Get the embedding model name.
    fn model_name(&self) -> &str;

    /// Embed a single text into a vector.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;
}

/// A mock embedder for testing.
///
/// Returns a fixed default vector unless a per-text override is registered.
/// Texts registered as failing return an API error, which lets tests
/// exercise partial and total retrieval failure.
pub struct MockEmbedder {
    dimension: usize,
    vectors: std::collections::HashMap<String, Vec<f32>>,
    failing: std::collections::HashSet<String>,
    fail_all: bool,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockEmbedder {
    /// Create a new mock embedder producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: std::collections::HashMap::new(),
            failing: std::collections::HashSet::new(),
            fail_all: false,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Register a canned vector for an exact text.
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Make embedding fail for an exact text.
    pub fn with_failure(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Make every embedding call fail.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Number of embed calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail_all || self.failing.contains(text) {
            return Err(EmbeddingError::Api(format!(
                "mock embedding failure for {text:?}"
            )));
        }

        if let Some(vector) = self.vectors.get(text) {
            return Ok(vector.clone());
        }

        // Default: a unit vector along the first axis
        let mut vector = vec![0.0; self.dimension];
        if let Some(first) = vector.first_mut() {
            *first = 1.0;
        }
        Ok(vector)
    }
}
