//! Error types for Neura.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeuraError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model server error: {0}")]
    Upstream(String),

    #[error("Context retrieval unavailable: {0}")]
    Retrieval(String),

    #[error("Empty input")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
