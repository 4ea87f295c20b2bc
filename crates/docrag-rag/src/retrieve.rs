//! Concurrent retrieval across query variants.
//!
//! Each variant is embedded and searched independently; the fan-in barrier
//! waits for every lookup to settle before merging. A failed variant costs
//! its results, not the request — unless every variant fails.

use docrag_embeddings::{Embedder, EmbeddingError};
use docrag_vectors::{DocumentHit, StoreError, VectorSearch};
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

/// Errors from the retrieval coordinator.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("all {0} query variants failed retrieval")]
    AllVariantsFailed(usize),
}

/// Failure of a single variant's embed+search lookup.
#[derive(Debug, Error)]
enum VariantError {
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbeddingError),

    #[error("search failed: {0}")]
    Search(#[from] StoreError),
}

/// The deduplicated documentation context for one request.
///
/// Passages are unique by byte-identical content and kept in first-occurrence
/// order. The order across variants depends on fan-in interleaving and is
/// not guaranteed stable across runs.
#[derive(Debug, Clone, Default)]
pub struct ContextBlock {
    passages: Vec<String>,
}

impl ContextBlock {
    /// Build a context block from retrieved hits, deduplicating by content.
    pub fn from_hits(hits: impl IntoIterator<Item = DocumentHit>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut passages = Vec::new();

        for hit in hits {
            if seen.insert(hit.content.clone()) {
                passages.push(hit.content);
            }
        }

        Self { passages }
    }

    /// Number of unique passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// True when no passage survived retrieval.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// The unique passages, in first-occurrence order.
    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    /// Join the passages into the prompt context string.
    pub fn as_text(&self) -> String {
        self.passages.join("\n\n")
    }
}

async fn lookup_variant(
    embedder: &dyn Embedder,
    store: &dyn VectorSearch,
    variant: &str,
    k: usize,
) -> Result<Vec<DocumentHit>, VariantError> {
    let vector = embedder.embed(variant).await?;
    let hits = store.search(&vector, k).await?;
    Ok(hits)
}

/// Retrieve and merge context for a set of query variants.
///
/// All variant lookups run concurrently; the call returns once every one
/// has settled. Individual failures are logged and absorbed as empty result
/// sets. An empty merged context is a valid outcome, not an error.
pub async fn retrieve(
    embedder: &dyn Embedder,
    store: &dyn VectorSearch,
    variants: &[String],
    k: usize,
) -> Result<ContextBlock, RetrievalError> {
    let lookups = variants
        .iter()
        .map(|variant| lookup_variant(embedder, store, variant, k));
    let results = join_all(lookups).await;

    let mut failed = 0;
    let mut hits = Vec::new();

    for (variant, result) in variants.iter().zip(results) {
        match result {
            Ok(found) => hits.extend(found),
            Err(e) => {
                failed += 1;
                warn!(variant = %variant, error = %e, "variant retrieval failed, continuing without it");
            }
        }
    }

    if !variants.is_empty() && failed == variants.len() {
        return Err(RetrievalError::AllVariantsFailed(failed));
    }

    Ok(ContextBlock::from_hits(hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_embeddings::MockEmbedder;
    use docrag_vectors::{InMemoryStore, MemoryRecord};

    fn hit(content: &str) -> DocumentHit {
        DocumentHit::new(content)
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let block = ContextBlock::from_hits(vec![
            hit("alpha"),
            hit("beta"),
            hit("alpha"),
            hit("gamma"),
            hit("beta"),
        ]);

        assert_eq!(block.passages(), ["alpha", "beta", "gamma"]);
        assert_eq!(block.as_text(), "alpha\n\nbeta\n\ngamma");
    }

    #[test]
    fn test_dedup_is_idempotent_across_orderings() {
        let inputs = [
            vec!["a", "a", "b"],
            vec!["a", "b", "a"],
            vec!["b", "a", "a"],
        ];

        for input in inputs {
            let block = ContextBlock::from_hits(input.iter().map(|c| hit(c)));
            assert_eq!(block.len(), 2);
        }
    }

    #[test]
    fn test_dedup_is_content_sensitive_not_source_sensitive() {
        let block = ContextBlock::from_hits(vec![
            DocumentHit::new("same text").with_source("https://a"),
            DocumentHit::new("same text").with_source("https://b"),
        ]);

        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_empty_context_block() {
        let block = ContextBlock::from_hits(vec![]);
        assert!(block.is_empty());
        assert_eq!(block.as_text(), "");
    }

    #[tokio::test]
    async fn test_retrieve_merges_across_variants() {
        let embedder = MockEmbedder::new(2)
            .with_vector("v1", vec![1.0, 0.0])
            .with_vector("v2", vec![0.0, 1.0]);
        let store = InMemoryStore::new(2);
        store
            .add(vec![
                MemoryRecord::new("a", vec![1.0, 0.0], "passage a"),
                MemoryRecord::new("b", vec![0.0, 1.0], "passage b"),
            ])
            .unwrap();

        let variants = vec!["v1".to_string(), "v2".to_string()];
        let block = retrieve(&embedder, &store, &variants, 1).await.unwrap();

        assert_eq!(block.passages(), ["passage a", "passage b"]);
    }

    #[tokio::test]
    async fn test_retrieve_absorbs_partial_failures() {
        let embedder = MockEmbedder::new(2)
            .with_vector("good", vec![1.0, 0.0])
            .with_failure("bad");
        let store = InMemoryStore::new(2);
        store
            .add(vec![MemoryRecord::new("a", vec![1.0, 0.0], "survivor")])
            .unwrap();

        let variants = vec!["good".to_string(), "bad".to_string()];
        let block = retrieve(&embedder, &store, &variants, 5).await.unwrap();

        assert_eq!(block.passages(), ["survivor"]);
    }

    #[tokio::test]
    async fn test_retrieve_fails_when_all_variants_fail() {
        let embedder = MockEmbedder::new(2).failing();
        let store = InMemoryStore::new(2);

        let variants = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let result = retrieve(&embedder, &store, &variants, 5).await;

        assert!(matches!(result, Err(RetrievalError::AllVariantsFailed(3))));
    }

    #[tokio::test]
    async fn test_retrieve_empty_store_is_not_an_error() {
        let embedder = MockEmbedder::new(2);
        let store = InMemoryStore::new(2);

        let variants = vec!["v1".to_string()];
        let block = retrieve(&embedder, &store, &variants, 30).await.unwrap();

        assert!(block.is_empty());
    }
}
