//! Core chat turn handling for Neura.
//!
//! Streamed model output flows `LineBuffer` -> `StreamDecoder` -> fragment
//! accumulation inside `ChatSession`, which also builds each prompt from the
//! rolling conversation window and any retrieved context.

mod code;
mod context;
mod conversation;
mod decoder;
mod error;
mod history;
mod indexer;
mod line_buffer;
mod ollama;
mod prompt;
mod retrieval;
mod session;

pub use code::{fence_language, save_snippet, strip_code_fences, CodeClassifier, MarkerClassifier};
pub use context::ContextFormatter;
pub use conversation::ConversationState;
pub use decoder::StreamDecoder;
pub use error::NeuraError;
pub use history::{HistoryFile, TurnSink};
pub use indexer::{scan_source_files, IndexReport};
pub use line_buffer::LineBuffer;
pub use ollama::{ChunkStream, Embedder, ModelBackend, OllamaClient};
pub use prompt::{PromptAssembler, LOOKBACK_WINDOW};
pub use retrieval::{ChromaRetriever, ContextRetriever, RetrievalConfig, RetryPolicy};
pub use session::{
    classify_input, ChatSession, InputAction, PromptSource, SessionConfig, TurnObserver,
    TurnOutcome, TurnState,
};

/// Result type for Neura operations.
pub type Result<T> = std::result::Result<T, NeuraError>;
