//! Query expansion.
//!
//! One user query becomes several semantically diverse variants to widen
//! retrieval recall. The variants come from a single non-streaming call to
//! the selected chat backend.

use docrag_llm::{ChatBackend, ExpansionPrompt, LlmError, PromptTemplate};
use thiserror::Error;

/// Errors from query expansion.
#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("expansion model call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("expansion produced no usable variants")]
    NoVariants,
}

/// Configuration for query expansion.
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    /// Number of variants requested from the model.
    pub num_variants: usize,
    /// Whether the raw query itself joins the variant set.
    pub include_original: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            num_variants: 5,
            include_original: true,
        }
    }
}

/// Expand a query into retrieval variants.
///
/// The model is asked for a numbered list; lines that merely echo the
/// original query are discarded wherever they appear, rather than assuming
/// the echo is always the first item. Fails if the model call fails or no
/// usable variant survives parsing.
pub async fn expand_query(
    backend: &dyn ChatBackend,
    query: &str,
    config: &ExpansionConfig,
) -> Result<Vec<String>, ExpansionError> {
    let prompt = ExpansionPrompt::new(query).with_num_variants(config.num_variants);
    let response = backend.complete(&prompt.generate()).await?;

    let mut variants = parse_numbered_list(&response);
    variants.retain(|v| !echoes_query(v, query));

    if config.include_original {
        variants.insert(0, query.to_string());
    }

    if variants.is_empty() {
        return Err(ExpansionError::NoVariants);
    }

    Ok(variants)
}

/// Parse a numbered (or bulleted) list out of a model response.
///
/// Lines carrying an enumeration marker are preferred; if the model ignored
/// the list format entirely, every non-empty line is taken instead.
fn parse_numbered_list(response: &str) -> Vec<String> {
    let enumerated: Vec<String> = response
        .lines()
        .filter_map(strip_enumeration)
        .collect();

    if !enumerated.is_empty() {
        return enumerated;
    }

    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip a leading enumeration marker, returning the remainder if the line
/// actually carried one.
fn strip_enumeration(line: &str) -> Option<String> {
    let line = line.trim();

    let rest = if let Some(rest) = line.strip_prefix('-') {
        rest
    } else if let Some(rest) = line.strip_prefix('*') {
        rest
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        let rest = &line[digits..];
        rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?
    };

    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Does a parsed variant merely restate the original query?
fn echoes_query(variant: &str, query: &str) -> bool {
    let normalize = |s: &str| s.trim().trim_matches('"').trim().to_lowercase();
    normalize(variant) == normalize(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_llm::MockChat;

    #[test]
    fn test_parse_numbered_list() {
        let response = "1. What does 'cmd' mean in Golang?\n\
                        2. Explain 'cmd' with examples.\n\
                        3) How does 'cmd' work in Golang?";
        let variants = parse_numbered_list(response);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], "What does 'cmd' mean in Golang?");
        assert_eq!(variants[2], "How does 'cmd' work in Golang?");
    }

    #[test]
    fn test_parse_skips_header_lines() {
        let response = "Here are 5 variations:\n\
                        1. First variant\n\
                        2. Second variant";
        let variants = parse_numbered_list(response);
        assert_eq!(variants, vec!["First variant", "Second variant"]);
    }

    #[test]
    fn test_parse_bulleted_list() {
        let response = "- \"What is cmd?\"\n- \"Explain cmd.\"";
        let variants = parse_numbered_list(response);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0], "\"What is cmd?\"");
    }

    #[test]
    fn test_parse_falls_back_to_plain_lines() {
        let response = "What is cmd?\n\nExplain cmd.";
        let variants = parse_numbered_list(response);
        assert_eq!(variants, vec!["What is cmd?", "Explain cmd."]);
    }

    #[test]
    fn test_echo_detection() {
        assert!(echoes_query("what is cmd in golang", "what is cmd in golang"));
        assert!(echoes_query("\"What is cmd in Golang\"", "what is cmd in golang"));
        assert!(!echoes_query("What does cmd mean?", "what is cmd in golang"));
    }

    #[tokio::test]
    async fn test_expand_discards_echo_wherever_it_appears() {
        let backend = MockChat::new().with_response(
            "variations",
            "1. Explain cmd.\n2. \"what is cmd in golang\"\n3. How does cmd work?",
        );

        let config = ExpansionConfig {
            num_variants: 5,
            include_original: false,
        };
        let variants = expand_query(&backend, "what is cmd in golang", &config)
            .await
            .unwrap();

        assert_eq!(variants, vec!["Explain cmd.", "How does cmd work?"]);
    }

    #[tokio::test]
    async fn test_expand_includes_original_first() {
        let backend = MockChat::new().with_response("variations", "1. Variant one");

        let variants = expand_query(&backend, "my query", &ExpansionConfig::default())
            .await
            .unwrap();

        assert_eq!(variants[0], "my query");
        assert_eq!(variants[1], "Variant one");
    }

    #[tokio::test]
    async fn test_expand_fails_with_no_variants() {
        let backend = MockChat::new().with_response("variations", "");

        let config = ExpansionConfig {
            num_variants: 5,
            include_original: false,
        };
        let result = expand_query(&backend, "my query", &config).await;

        assert!(matches!(result, Err(ExpansionError::NoVariants)));
    }
}
