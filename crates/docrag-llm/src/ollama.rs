//! Ollama backend for local chat inference.
//!
//! Requires a running Ollama instance. Streaming uses the NDJSON response
//! of `/api/generate` with `stream: true`.

use crate::backend::{
    ChatBackend, ChatConfig, LlmError, LlmResult, TokenStream, STREAM_CHANNEL_CAPACITY,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Ollama API request.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

/// Ollama API response, one JSON object per NDJSON line when streaming.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    done: bool,
}

/// Ollama backend for local chat inference.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_llm::{ChatBackend, OllamaChat};
///
/// let backend = OllamaChat::new("http://localhost:11434");
/// let mut stream = backend.stream("Explain goroutines.").await?;
/// while let Some(fragment) = stream.recv().await {
///     print!("{}", fragment?);
/// }
/// ```
pub struct OllamaChat {
    endpoint: String,
    config: ChatConfig,
    client: reqwest::Client,
}

impl OllamaChat {
    /// Create a new Ollama backend with the local-small preset.
    pub fn new(endpoint: &str) -> Self {
        Self::with_config(endpoint, ChatConfig::local_small())
    }

    /// Create with custom config.
    pub fn with_config(endpoint: &str, config: ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
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

    fn request_body(&self, prompt: &str, stream: bool) -> OllamaRequest {
        OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                num_ctx: self.config.context_window,
            },
        }
    }

    async fn send(&self, prompt: &str, stream: bool) -> LlmResult<reqwest::Response> {
        let url = format!("{}/api/generate", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, stream))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::ConnectionFailed(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.endpoint
                    ))
                } else if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::Api(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 {
                return Err(LlmError::ModelNotFound(format!(
                    "Model '{}' not found. Run: ollama pull {}",
                    self.config.model, self.config.model
                )));
            }

            return Err(LlmError::Api(format!("Ollama error {}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let response = self.send(prompt, false).await?;

        let resp: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(resp.response)
    }

    async fn stream(&self, prompt: &str) -> LlmResult<TokenStream> {
        let response = self.send(prompt, true).await?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        // Transport fault mid-stream: surface it, never truncate silently
                        let _ = tx.send(Err(LlmError::Stream(e.to_string()))).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete NDJSON lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer.drain(..line_end + 1).collect::<String>();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<OllamaResponse>(line) {
                        Ok(resp) => {
                            if !resp.response.is_empty()
                                && tx.send(Ok(resp.response)).await.is_err()
                            {
                                // Receiver dropped, stop streaming
                                debug!("fragment receiver dropped; cancelling generation");
                                return;
                            }
                            if resp.done {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(LlmError::InvalidResponse(e.to_string()))).await;
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let url = format!("{}/api/tags", self.endpoint);

        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
