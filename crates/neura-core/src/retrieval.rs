//! Context retrieval against a Chroma vector store.

use crate::ollama::check_status;
use crate::{Embedder, NeuraError, Result};
use async_trait::async_trait;
use neura_types::ContextSnippet;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Source of context snippets for a prompt.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Up to `limit` snippets for `query`, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContextSnippet>>;
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts run out; the last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            tracing::info!(target: "neura::retrieval", "Attempting to {} (attempt {}/{})", label, attempt, max_attempts);
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        target: "neura::retrieval",
                        "Failed to {}: {}, retrying in {}ms",
                        label,
                        e,
                        self.delay.as_millis()
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(target: "neura::retrieval", "Failed to {} after {} attempts: {}", label, max_attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Connection settings for `ChromaRetriever`.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub chroma_url: String,
    pub collection: String,
    pub embedding_model: String,
    pub retry: RetryPolicy,
    /// Bound on each Chroma request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chroma_url: "http://localhost:8000".to_string(),
            collection: "codebase_context".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }
}

/// Metadata stored alongside each indexed document.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DocumentMetadata {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
}

/// Retriever backed by a Chroma collection, embedding through an `Embedder`.
pub struct ChromaRetriever {
    http: Client,
    base_url: String,
    collection_id: String,
    embedding_model: String,
    embedder: Arc<dyn Embedder>,
}

impl ChromaRetriever {
    /// Get or create the configured collection, retrying per the config's policy.
    pub async fn connect(config: &RetrievalConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let http = builder.build()?;
        let base_url = config.chroma_url.trim_end_matches('/').to_string();

        let collection_id = config
            .retry
            .run("connect to Chroma", || {
                get_or_create_collection(&http, &base_url, &config.collection)
            })
            .await?;

        tracing::info!(
            target: "neura::retrieval",
            "Connected to Chroma collection '{}' ({})",
            config.collection,
            collection_id
        );

        Ok(Self {
            http,
            base_url,
            collection_id,
            embedding_model: config.embedding_model.clone(),
            embedder,
        })
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    fn collection_url(&self, action: &str) -> String {
        format!("{}/api/v1/collections/{}/{}", self.base_url, self.collection_id, action)
    }

    /// Insert or replace one document.
    pub(crate) async fn upsert(&self, id: &str, document: &str, metadata: &DocumentMetadata) -> Result<()> {
        let embedding = self.embedder.embed(&self.embedding_model, document).await?;
        let body = json!({
            "ids": [id],
            "embeddings": [embedding],
            "documents": [document],
            "metadatas": [metadata],
        });

        let response = self.http.post(self.collection_url("upsert")).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ContextRetriever for ChromaRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContextSnippet>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(&self.embedding_model, query).await?;
        let body = json!({
            "query_embeddings": [embedding],
            "n_results": limit,
            "include": ["documents", "metadatas"],
        });

        let response = self.http.post(self.collection_url("query")).json(&body).send().await?;
        let response = check_status(response).await?;
        let results: QueryResponse = response.json().await?;

        let snippets = snippets_from_query(results);
        tracing::debug!(target: "neura::retrieval", "Query returned {} snippets", snippets.len());
        Ok(snippets)
    }
}

async fn get_or_create_collection(http: &Client, base_url: &str, name: &str) -> Result<String> {
    let body = json!({
        "name": name,
        "metadata": { "description": "Codebase context for RAG" },
        "get_or_create": true,
    });

    let response = http
        .post(format!("{}/api/v1/collections", base_url))
        .json(&body)
        .send()
        .await?;
    let response = check_status(response).await?;
    let collection: CollectionResponse = response
        .json()
        .await
        .map_err(|e| NeuraError::Retrieval(format!("unexpected collection payload: {}", e)))?;
    Ok(collection.id)
}

/// Zip the first query's documents with their metadata, keeping result order.
fn snippets_from_query(results: QueryResponse) -> Vec<ContextSnippet> {
    let Some(documents) = results.documents.and_then(|docs| docs.into_iter().next()) else {
        return Vec::new();
    };
    let metadatas = results
        .metadatas
        .and_then(|metas| metas.into_iter().next())
        .unwrap_or_default();

    documents
        .into_iter()
        .enumerate()
        .map(|(i, document)| {
            let metadata = metadatas.get(i).cloned().flatten().unwrap_or_default();
            ContextSnippet {
                content: document.unwrap_or_default(),
                source_path: string_field(&metadata, "path"),
                kind: string_field(&metadata, "type"),
                last_modified: string_field(&metadata, "lastModified"),
            }
        })
        .collect()
}

fn string_field(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_snippets_from_query_maps_metadata() {
        let results: QueryResponse = serde_json::from_value(json!({
            "ids": [["src/a.rs", "src/b.rs"]],
            "documents": [["fn a() {}", null]],
            "metadatas": [[
                {"path": "src/a.rs", "type": "code", "lastModified": "2024-01-01T00:00:00.000Z"},
                null
            ]]
        }))
        .unwrap();

        let snippets = snippets_from_query(results);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].content, "fn a() {}");
        assert_eq!(snippets[0].source_path.as_deref(), Some("src/a.rs"));
        assert_eq!(snippets[0].kind.as_deref(), Some("code"));
        assert_eq!(snippets[1].content, "");
        assert_eq!(snippets[1].source_path, None);
    }

    #[test]
    fn test_snippets_from_empty_query() {
        assert!(snippets_from_query(QueryResponse::default()).is_empty());
        let results: QueryResponse = serde_json::from_value(json!({"documents": []})).unwrap();
        assert!(snippets_from_query(results).is_empty());
    }

    #[tokio::test]
    async fn test_retry_policy_stops_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NeuraError::Retrieval("down".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_policy_returns_first_success() {
        let policy = RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);

        let value = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err(NeuraError::Retrieval("not yet".into()))
                } else {
                    Ok(n)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
