//! Prompt templates for query expansion and grounded answering.

/// Literal phrase the model must reproduce when the supplied context does
/// not answer the question. Treated as a contract by callers and tests.
pub const NO_DOCUMENTATION_FALLBACK: &str = "Not enough documentation found.";

/// Literal identity reply the model is instructed to give when asked who it is.
pub const ASSISTANT_IDENTITY: &str = "I am a Golang documentation assistant, nothing more.";

/// A prompt template for LLM requests.
pub trait PromptTemplate {
    /// Generate the prompt text.
    fn generate(&self) -> String;

    /// Get the system prompt (if any).
    fn system_prompt(&self) -> Option<String> {
        None
    }
}

/// Prompt asking the model for diverse rephrasings of a query.
#[derive(Debug, Clone)]
pub struct ExpansionPrompt {
    /// The query to expand.
    pub query: String,
    /// Number of variants requested.
    pub num_variants: usize,
}

impl ExpansionPrompt {
    /// Create a new expansion prompt.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_variants: 5,
        }
    }

    /// Set the number of variants requested.
    pub fn with_num_variants(mut self, num_variants: usize) -> Self {
        self.num_variants = num_variants;
        self
    }
}

impl PromptTemplate for ExpansionPrompt {
    fn generate(&self) -> String {
        format!(
            r#"Generate {n} diverse variations of the following query to help retrieve relevant Golang documentation.
The variations should rephrase the question in different ways to improve search results.

Original Query: "{query}"

Examples of good variations:
- "What does '{query}' mean in Golang?"
- "Explain '{query}' with examples."
- "How does '{query}' work in Golang?"

Return only the variations, as a numbered list."#,
            n = self.num_variants,
            query = self.query,
        )
    }
}

/// Prompt grounding the model's answer in retrieved documentation.
#[derive(Debug, Clone)]
pub struct AnswerPrompt {
    /// The user's question.
    pub query: String,
    /// Deduplicated documentation context; may be empty.
    pub context: String,
}

impl AnswerPrompt {
    /// Create a new answer prompt.
    pub fn new(query: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: context.into(),
        }
    }
}

impl PromptTemplate for AnswerPrompt {
    fn generate(&self) -> String {
        format!(
            r#"You are an AI assistant specializing in Golang documentation.
You are not a general AI, not a chatbot, and you should never claim
to be anything other than a Golang documentation assistant.

Rules for responses:
- Always think before responding, ensuring accuracy.
- Do not generate any information beyond what is provided in the context.
- If the user asks about your identity, always respond with:
  "{identity}"
- If the answer is not found in the provided documentation, respond with:
  "{fallback}"

Context:
{context}

User Question:
"{query}"

Response (strictly based on context):"#,
            identity = ASSISTANT_IDENTITY,
            fallback = NO_DOCUMENTATION_FALLBACK,
            context = self.context,
            query = self.query,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_prompt_mentions_query_and_count() {
        let prompt = ExpansionPrompt::new("what is cmd in golang").generate();
        assert!(prompt.contains("what is cmd in golang"));
        assert!(prompt.contains("5 diverse variations"));
        assert!(prompt.contains("numbered list"));
    }

    #[test]
    fn test_expansion_prompt_variant_count_override() {
        let prompt = ExpansionPrompt::new("q").with_num_variants(3).generate();
        assert!(prompt.contains("3 diverse variations"));
    }

    #[test]
    fn test_answer_prompt_carries_contract_phrases() {
        let prompt = AnswerPrompt::new("what is cmd", "cmd holds main packages").generate();
        assert!(prompt.contains(NO_DOCUMENTATION_FALLBACK));
        assert!(prompt.contains(ASSISTANT_IDENTITY));
        assert!(prompt.contains("cmd holds main packages"));
        assert!(prompt.contains("\"what is cmd\""));
    }

    #[test]
    fn test_answer_prompt_well_formed_with_empty_context() {
        let prompt = AnswerPrompt::new("what is cmd", "").generate();
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains(NO_DOCUMENTATION_FALLBACK));
    }
}
