//! In-memory vector store implementation.
//!
//! Brute-force cosine search over records held in memory. Used by the test
//! suites; not meant for a real corpus.

use crate::{DocumentHit, StoreError, StoreResult, VectorSearch};
use async_trait::async_trait;
use std::sync::RwLock;

/// A stored passage with its embedding.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    /// Unique identifier for this record.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// The passage text.
    pub content: String,
    /// Optional source identifier.
    pub source: Option<String>,
}

impl MemoryRecord {
    /// Create a new record.
    pub fn new(id: impl Into<String>, vector: Vec<f32>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vector,
            content: content.into(),
            source: None,
        }
    }

    /// Attach a source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// In-memory vector store using brute-force cosine search.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_vectors::{InMemoryStore, MemoryRecord, VectorSearch};
///
/// let store = InMemoryStore::new(3);
/// store.add(vec![
///     MemoryRecord::new("a", vec![1.0, 0.0, 0.0], "passage a"),
///     MemoryRecord::new("b", vec![0.0, 1.0, 0.0], "passage b"),
/// ])?;
///
/// let hits = store.search(&[1.0, 0.0, 0.0], 1).await?;
/// assert_eq!(hits[0].content, "passage a");
/// ```
pub struct InMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
    dimension: usize,
}

impl InMemoryStore {
    /// Create a new in-memory store with the specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dimension,
        }
    }

    /// Add records to the store.
    pub fn add(&self, records: Vec<MemoryRecord>) -> StoreResult<()> {
        let mut store = self
            .records
            .write()
            .map_err(|e| StoreError::Connection(format!("Failed to acquire write lock: {}", e)))?;

        for record in records {
            if record.vector.len() != self.dimension {
                return Err(StoreError::Config(format!(
                    "invalid vector dimension: expected {}, got {}",
                    self.dimension,
                    record.vector.len()
                )));
            }
            store.push(record);
        }

        Ok(())
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorSearch for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn collection(&self) -> &str {
        "in-memory"
    }

    async fn search(&self, vector: &[f32], k: usize) -> StoreResult<Vec<DocumentHit>> {
        if vector.len() != self.dimension {
            return Err(StoreError::Config(format!(
                "invalid query dimension: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        let store = self
            .records
            .read()
            .map_err(|e| StoreError::Connection(format!("Failed to acquire read lock: {}", e)))?;

        let mut scored: Vec<_> = store
            .iter()
            .map(|record| (record, cosine_similarity(vector, &record.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let hits = scored
            .into_iter()
            .take(k)
            .map(|(record, _)| DocumentHit {
                content: record.content.clone(),
                source: record.source.clone(),
            })
            .collect();

        Ok(hits)
    }
}
