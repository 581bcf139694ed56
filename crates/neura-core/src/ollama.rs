//! HTTP client for a local Ollama server.

use crate::{NeuraError, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use neura_types::{EmbeddingRequest, EmbeddingResponse, GenerateRequest, TagsResponse};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Raw transport chunks of a streamed generation, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// A model-serving endpoint.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Generate a complete response in one round trip.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Start a streamed generation. The stream ends when the transport closes.
    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ChunkStream>;
}

/// Produces embedding vectors for retrieval.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Client for the Ollama REST API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
    /// Whole-request limit for non-streaming calls.
    timeout: Option<Duration>,
}

impl OllamaClient {
    pub const DEFAULT_URL: &'static str = "http://localhost:11434";

    /// Create a client. A timeout bounds connection setup for every call and
    /// the full exchange for non-streaming calls.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Names of the installed models, e.g. `mistral:latest`.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let mut request = self.http.get(self.url("/api/tags"));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = check_status(request.send().await?).await?;
        let tags: TagsResponse = response.json().await?;
        let names: Vec<String> = tags.models.into_iter().map(|tag| tag.name).collect();
        tracing::debug!(target: "neura::model", "Server reports {} installed models", names.len());
        Ok(names)
    }

    fn generate_request(&self, model: &str, prompt: &str, stream: bool) -> GenerateRequest {
        GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream,
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        tracing::debug!(target: "neura::model", "Requesting batch generation from {} ({} prompt bytes)", model, prompt.len());

        let mut request = self
            .http
            .post(self.url("/api/generate"))
            .json(&self.generate_request(model, prompt, false));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = check_status(request.send().await?).await?;
        let payload: Value = response.json().await?;
        batch_text(payload)
    }

    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ChunkStream> {
        tracing::debug!(target: "neura::model", "Requesting streamed generation from {} ({} prompt bytes)", model, prompt.len());

        let response = self
            .http
            .post(self.url("/api/generate"))
            .json(&self.generate_request(model, prompt, true))
            .send()
            .await?;
        let response = check_status(response).await?;

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(NeuraError::from));
        Ok(chunks.boxed())
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let mut request = self.http.post(self.url("/api/embeddings")).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = check_status(request.send().await?).await?;
        let embedding: EmbeddingResponse = response.json().await?;
        Ok(embedding.embedding)
    }
}

/// Turn a non-success response into `NeuraError::Status`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(NeuraError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Extract the result text from a non-streaming payload.
///
/// Falls back to `completion`, then to the whole payload pretty-printed.
fn batch_text(payload: Value) -> Result<String> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(NeuraError::Upstream(message.to_string()));
    }

    for field in ["response", "completion"] {
        if let Some(text) = payload.get(field).and_then(Value::as_str) {
            return Ok(text.to_string());
        }
    }

    Ok(serde_json::to_string_pretty(&payload)?)
}
