//! Gemini backend for hosted chat inference.
//!
//! Requires a Google AI API key. Streaming uses the SSE form of
//! `streamGenerateContent`.

use crate::backend::{
    ChatBackend, ChatConfig, LlmError, LlmResult, TokenStream, STREAM_CHANNEL_CAPACITY,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

/// Gemini API response, also the payload of each SSE `data:` event.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenate the text of all parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Gemini backend for hosted chat inference.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_llm::{ChatBackend, GeminiChat};
///
/// let backend = GeminiChat::new("AIza...");
/// let mut stream = backend.stream("Explain goroutines.").await?;
/// ```
pub struct GeminiChat {
    api_key: String,
    config: ChatConfig,
    client: reqwest::Client,
}

impl GeminiChat {
    /// Create a new Gemini backend with the hosted-large preset.
    pub fn new(api_key: &str) -> Self {
        Self::with_config(api_key, ChatConfig::hosted_large())
    }

    /// Create with custom config.
    pub fn with_config(api_key: &str, config: ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.to_string(),
            config,
            client,
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> LlmResult<Self> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| LlmError::AuthenticationFailed)?;
        Ok(Self::new(&api_key))
    }

    fn request_body(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
        }
    }

    async fn send(&self, prompt: &str, streaming: bool) -> LlmResult<reqwest::Response> {
        let url = if streaming {
            format!(
                "{}/{}:streamGenerateContent?alt=sse&key={}",
                GEMINI_API_URL, self.config.model, self.api_key
            )
        } else {
            format!(
                "{}/{}:generateContent?key={}",
                GEMINI_API_URL, self.config.model, self.api_key
            )
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::ConnectionFailed("Cannot connect to Gemini API".to_string())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::Api(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                404 => LlmError::ModelNotFound(self.config.model.clone()),
                429 => LlmError::RateLimited(60),
                _ => LlmError::Api(format!("Gemini API error {}: {}", status, body)),
            });
        }

        Ok(response)
    }

    /// Extract the text fragment from one SSE event, if it carries any.
    fn parse_sse_event(event: &str) -> Option<String> {
        for line in event.lines() {
            if let Some(data) = line.strip_prefix("data: ") {
                if let Ok(resp) = serde_json::from_str::<GeminiResponse>(data) {
                    let text = resp.text();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
        }
        None
    }
}

#[async_trait]
impl ChatBackend for GeminiChat {
    fn name(&self) -> &str {
        "gemini"
    }

    fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let response = self.send(prompt, false).await?;

        let resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = resp.text();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "No content in response".to_string(),
            ));
        }

        Ok(text)
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

                // Process complete SSE events
                while let Some(event_end) = buffer.find("\n\n") {
                    let event = buffer.drain(..event_end + 2).collect::<String>();

                    if let Some(text) = Self::parse_sse_event(&event) {
                        if tx.send(Ok(text)).await.is_err() {
                            // Receiver dropped, stop streaming
                            debug!("fragment receiver dropped; cancelling generation");
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_config() {
        let backend = GeminiChat::new("test-key");
        assert!(backend.config.model.contains("gemini"));
        assert!((backend.config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_body_shape() {
        let backend = GeminiChat::new("test-key");
        let body = backend.request_body("hello");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8500);
        assert_eq!(json["generationConfig"]["topK"], 80);
    }

    #[test]
    fn test_parse_sse_event() {
        let event = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":",
            "[{\"text\":\"Hello \"},{\"text\":\"world\"}],\"role\":\"model\"}}]}\n"
        );
        assert_eq!(
            GeminiChat::parse_sse_event(event),
            Some("Hello world".to_string())
        );
    }

    #[test]
    fn test_parse_sse_event_without_text() {
        assert_eq!(GeminiChat::parse_sse_event("data: {}\n"), None);
        assert_eq!(GeminiChat::parse_sse_event(": keepalive\n"), None);
    }

    #[test]
    fn test_response_text_empty_candidates() {
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.text().is_empty());
    }
}
