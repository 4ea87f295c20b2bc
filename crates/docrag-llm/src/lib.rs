//! # docrag LLM
//!
//! Chat model backends and prompt templates for docrag.
//!
//! Two backends serve generation: a local small model via Ollama and a
//! hosted large model via the Gemini API. Both expose one-shot completion
//! (used by query expansion) and incremental streaming over a fragment
//! channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_llm::{ChatBackend, ModelSelector, OllamaChat};
//!
//! let backend = OllamaChat::new("http://localhost:11434");
//! let mut stream = backend.stream("Explain goroutines.").await?;
//! while let Some(fragment) = stream.recv().await {
//!     print!("{}", fragment?);
//! }
//! ```

mod backend;
mod gemini;
mod mock;
mod ollama;
mod prompt;

pub use backend::{ChatBackend, ChatConfig, LlmError, LlmResult, ModelSelector, TokenStream};
pub use gemini::GeminiChat;
pub use mock::MockChat;
pub use ollama::OllamaChat;
pub use prompt::{
    AnswerPrompt, ExpansionPrompt, PromptTemplate, ASSISTANT_IDENTITY, NO_DOCUMENTATION_FALLBACK,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ChatBackend, ChatConfig, LlmError, LlmResult, ModelSelector, TokenStream};
    pub use crate::{AnswerPrompt, ExpansionPrompt, PromptTemplate, NO_DOCUMENTATION_FALLBACK};
    pub use crate::{GeminiChat, MockChat, OllamaChat};
}
