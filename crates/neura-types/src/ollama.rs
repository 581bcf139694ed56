//! Wire types for the Ollama HTTP API.
//! See https://github.com/ollama/ollama/blob/main/docs/api.md

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// One newline-delimited record of a streamed `/api/generate` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRecord {
    /// Incremental response text.
    #[serde(default)]
    pub response: Option<String>,
    /// Set on the final record of the stream.
    #[serde(default)]
    pub done: bool,
    /// Reported by the server when generation fails mid-stream.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Value,
}

/// Body of `GET /api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// An installed model as listed by `/api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(flatten)]
    pub extra: Value,
}

/// Body of `POST /api/embeddings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub prompt: String,
}

/// Response of `POST /api/embeddings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}
