//! Shared fakes for neura-core integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use neura_core::{
    ChunkStream, ContextRetriever, ModelBackend, NeuraError, PromptSource, Result, TurnObserver,
    TurnSink, TurnState,
};
use neura_types::{ContextSnippet, ConversationTurn};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build an NDJSON stream body from text fragments, ending with a done record.
pub fn ndjson_stream(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&json!({"model": "test", "response": fragment, "done": false}).to_string());
        body.push('\n');
    }
    body.push_str(&json!({"model": "test", "response": "", "done": true}).to_string());
    body.push('\n');
    body
}

/// Split `body` into chunks of at most `size` bytes.
pub fn chunked(body: &str, size: usize) -> Vec<Vec<u8>> {
    body.as_bytes().chunks(size.max(1)).map(|c| c.to_vec()).collect()
}

/// What a scripted backend returns for one call.
pub enum Reply {
    Chunks(Vec<Vec<u8>>),
    /// Chunks followed by a transport error mid-stream.
    ChunksThenError(Vec<Vec<u8>>),
    Batch(String),
    Refused,
}

/// Backend that replays scripted replies and records the prompts it saw.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn next_reply(&self, prompt: &str) -> Reply {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Refused)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn refused() -> NeuraError {
    NeuraError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
        match self.next_reply(prompt) {
            Reply::Batch(text) => Ok(text),
            _ => Err(refused()),
        }
    }

    async fn generate_stream(&self, _model: &str, prompt: &str) -> Result<ChunkStream> {
        match self.next_reply(prompt) {
            Reply::Chunks(chunks) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            Reply::ChunksThenError(chunks) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(NeuraError::Io(std::io::Error::other(
                        "connection reset",
                    )))));
                Ok(stream::iter(items).boxed())
            }
            _ => Err(refused()),
        }
    }
}

/// Retriever returning fixed snippets, or failing.
pub struct FixedRetriever {
    pub snippets: Option<Vec<ContextSnippet>>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FixedRetriever {
    pub fn with(snippets: Vec<ContextSnippet>) -> Self {
        Self {
            snippets: Some(snippets),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            snippets: None,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContextRetriever for FixedRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContextSnippet>> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        match &self.snippets {
            Some(snippets) => Ok(snippets.iter().take(limit).cloned().collect()),
            None => Err(NeuraError::Retrieval("collection not initialized".into())),
        }
    }
}

/// Sink that keeps every recorded turn in memory.
#[derive(Default)]
pub struct MemorySink {
    pub turns: Mutex<Vec<ConversationTurn>>,
}

impl TurnSink for MemorySink {
    fn record(&self, turn: &ConversationTurn) -> Result<()> {
        self.turns.lock().unwrap().push(turn.clone());
        Ok(())
    }
}

/// Sink whose every write fails, counting the attempts.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: Mutex<usize>,
}

impl TurnSink for FailingSink {
    fn record(&self, _turn: &ConversationTurn) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        Err(NeuraError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "history file is read-only",
        )))
    }
}

/// Input source replaying fixed lines, then closing.
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PromptSource for ScriptedInput {
    async fn next_prompt(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Observer recording everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    pub states: Vec<TurnState>,
    pub fragments: Vec<String>,
    pub completed: Vec<ConversationTurn>,
    pub failures: Vec<String>,
    pub empty_inputs: usize,
}

impl TurnObserver for RecordingObserver {
    fn on_state(&mut self, state: TurnState) {
        self.states.push(state);
    }

    fn on_fragment(&mut self, fragment: &str) {
        self.fragments.push(fragment.to_string());
    }

    fn on_empty_input(&mut self) {
        self.empty_inputs += 1;
    }

    fn on_complete(&mut self, turn: &ConversationTurn) {
        self.completed.push(turn.clone());
    }

    fn on_failed(&mut self, error: &NeuraError) {
        self.failures.push(error.to_string());
    }
}
