//! Chroma vector database adapter.
//!
//! Speaks the Chroma REST API: the collection id is resolved once when
//! connecting, then nearest-neighbor queries go through the collection's
//! `query` endpoint.

use crate::{DocumentHit, StoreError, StoreResult, VectorSearch};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chroma vector database adapter.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_vectors::{ChromaStore, VectorSearch};
///
/// let store = ChromaStore::connect("localhost", 8000, "golang_docs").await?;
/// let hits = store.search(&vector, 30).await?;
/// ```
pub struct ChromaStore {
    client: Client,
    base_url: String,
    collection_name: String,
    collection_id: String,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Option<Vec<Vec<String>>>,
    metadatas: Option<Vec<Vec<Option<HashMap<String, serde_json::Value>>>>>,
}

impl ChromaStore {
    /// Connect to a Chroma server and resolve the collection id.
    ///
    /// # Arguments
    ///
    /// * `host` - Chroma server host (e.g., "localhost")
    /// * `port` - Chroma server port (e.g., 8000)
    /// * `collection` - Name of the collection to query
    pub async fn connect(host: &str, port: u16, collection: &str) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let base_url = format!("http://{}:{}/api/v1", host, port);
        let url = format!("{}/collections/{}", base_url, collection);

        let response = client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                StoreError::Connection(format!(
                    "Cannot connect to Chroma at {}:{}. Is the server running?",
                    host, port
                ))
            } else {
                StoreError::Api(e.to_string())
            }
        })?;

        if response.status().as_u16() == 404 {
            return Err(StoreError::Collection(format!(
                "Collection '{}' not found",
                collection
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!(
                "Chroma error {}: {}",
                status, body
            )));
        }

        let info: CollectionInfo = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            collection_name: collection.to_string(),
            collection_id: info.id,
        })
    }
}

#[async_trait]
impl VectorSearch for ChromaStore {
    fn name(&self) -> &str {
        "chroma"
    }

    fn collection(&self) -> &str {
        &self.collection_name
    }

    async fn search(&self, vector: &[f32], k: usize) -> StoreResult<Vec<DocumentHit>> {
        let request = QueryRequest {
            query_embeddings: vec![vector.to_vec()],
            n_results: k,
            include: vec!["documents", "metadatas"],
        };

        let url = format!("{}/collections/{}/query", self.base_url, self.collection_id);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    StoreError::Connection(format!("Lost connection to Chroma: {}", e))
                } else {
                    StoreError::Api(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!(
                "Chroma query error {}: {}",
                status, body
            )));
        }

        let resp: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        // One query embedding in, one result row out
        let documents = resp
            .documents
            .and_then(|mut rows| (!rows.is_empty()).then(|| rows.remove(0)))
            .unwrap_or_default();
        let metadatas = resp
            .metadatas
            .and_then(|mut rows| (!rows.is_empty()).then(|| rows.remove(0)))
            .unwrap_or_default();

        let hits = documents
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let source = metadatas
                    .get(i)
                    .and_then(|m| m.as_ref())
                    .and_then(|m| m.get("url"))
                    .and_then(|v| v.as_str())
                    .map(String::from);

                DocumentHit { content, source }
            })
            .collect();

        Ok(hits)
    }
}
