//! A scripted chat backend for testing.

use crate::backend::{
    ChatBackend, ChatConfig, LlmError, LlmResult, TokenStream, STREAM_CHANNEL_CAPACITY,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A mock backend for testing.
///
/// Completions are matched against registered prompt patterns. Streams
/// either replay a script (which may include a mid-stream fault) or fall
/// back to emitting the canned completion as a single fragment. Every
/// prompt seen is recorded so tests can inspect what was sent.
pub struct MockChat {
    config: ChatConfig,
    responses: HashMap<String, String>,
    script: Mutex<Option<Vec<LlmResult<String>>>>,
    reject: Mutex<Option<LlmError>>,
    prompts: Mutex<Vec<String>>,
}

impl MockChat {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            config: ChatConfig::local_small().with_model("mock"),
            responses: HashMap::new(),
            script: Mutex::new(None),
            reject: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Add a canned response for a prompt pattern.
    pub fn with_response(mut self, pattern: &str, response: &str) -> Self {
        self.responses
            .insert(pattern.to_string(), response.to_string());
        self
    }

    /// Script the next stream's items, in order.
    pub fn with_stream(self, items: Vec<LlmResult<String>>) -> Self {
        *self.script.lock().unwrap() = Some(items);
        self
    }

    /// Make the next `stream` call fail before yielding any fragment.
    pub fn with_stream_rejection(self, error: LlmError) -> Self {
        *self.reject.lock().unwrap() = Some(error);
        self
    }

    /// All prompts seen by `complete` and `stream`, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn canned_response(&self, prompt: &str) -> String {
        for (pattern, response) in &self.responses {
            if prompt.contains(pattern) {
                return response.clone();
            }
        }
        "Mock response".to_string()
    }

    fn record(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.record(prompt);
        Ok(self.canned_response(prompt))
    }

    async fn stream(&self, prompt: &str) -> LlmResult<TokenStream> {
        self.record(prompt);

        if let Some(error) = self.reject.lock().unwrap().take() {
            return Err(error);
        }

        let items = self
            .script
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| vec![Ok(self.canned_response(prompt))]);

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_complete() {
        let backend = MockChat::new().with_response("test", "Test response");

        let response = backend.complete("This is a test").await.unwrap();
        assert_eq!(response, "Test response");
        assert_eq!(backend.prompts(), vec!["This is a test"]);
    }

    #[tokio::test]
    async fn test_mock_stream_default_single_fragment() {
        let backend = MockChat::new().with_response("question", "answer");

        let mut stream = backend.stream("a question").await.unwrap();
        assert_eq!(stream.recv().await.unwrap().unwrap(), "answer");
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_stream_script_with_fault() {
        let backend = MockChat::new().with_stream(vec![
            Ok("partial ".to_string()),
            Err(LlmError::Stream("connection reset".to_string())),
        ]);

        let mut stream = backend.stream("prompt").await.unwrap();
        assert_eq!(stream.recv().await.unwrap().unwrap(), "partial ");
        assert!(stream.recv().await.unwrap().is_err());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_stream_rejection() {
        let backend =
            MockChat::new().with_stream_rejection(LlmError::Api("rejected".to_string()));

        assert!(backend.stream("prompt").await.is_err());
    }
}
