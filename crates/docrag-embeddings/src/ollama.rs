//! Ollama embedding backend.
//!
//! Requires a running Ollama instance serving the embedding model.

use crate::embedder::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for the Ollama embedding client.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Embedding model name.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "qllama/bge-small-en-v1.5:latest".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Ollama embeddings API request.
#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

/// Ollama embeddings API response.
#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding client backed by the Ollama embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_embeddings::{Embedder, OllamaEmbedder};
///
/// let embedder = OllamaEmbedder::new("http://localhost:11434");
/// let vector = embedder.embed("what is cmd in golang").await?;
/// ```
pub struct OllamaEmbedder {
    endpoint: String,
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new embedder with the default model.
    pub fn new(endpoint: &str) -> Self {
        Self::with_config(endpoint, EmbeddingConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(endpoint: &str, config: EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            config,
            client,
        }
    }

    /// Create with default localhost endpoint.
    pub fn localhost() -> Self {
        Self::new("http://localhost:11434")
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: self.config.model.clone(),
            prompt: text.to_string(),
        };

        let url = format!("{}/api/embeddings", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingError::ConnectionFailed(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.endpoint
                    ))
                } else if e.is_timeout() {
                    EmbeddingError::Timeout(self.config.timeout_secs)
                } else {
                    EmbeddingError::Api(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!(
                "Ollama embeddings error {}: {}",
                status, body
            )));
        }

        let resp: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if resp.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding returned".to_string(),
            ));
        }

        Ok(resp.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let embedder = OllamaEmbedder::localhost();
        assert_eq!(embedder.endpoint, "http://localhost:11434");
        assert!(embedder.model_name().contains("bge-small"));
    }

    #[test]
    fn test_config_chaining() {
        let config = EmbeddingConfig::default()
            .with_model("bge-large:latest")
            .with_timeout(60);

        assert_eq!(config.model, "bge-large:latest");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let embedder = OllamaEmbedder::new("http://localhost:11434/");
        assert_eq!(embedder.endpoint, "http://localhost:11434");
    }
}
