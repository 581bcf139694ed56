//! Turn orchestration for an interactive chat session.
//!
//! Each turn walks a fixed state machine:
//! `Idle -> PromptBuilding -> Dispatching -> (Streaming | AwaitingBatch) -> Completed | Failed`.
//! Turns are strictly sequential; a failed turn reports and returns to `Idle`
//! without touching the conversation.

use crate::{
    ContextFormatter, ContextRetriever, ConversationState, LineBuffer, ModelBackend, NeuraError,
    PromptAssembler, Result, StreamDecoder, TurnSink,
};
use async_trait::async_trait;
use futures::StreamExt;
use neura_types::ConversationTurn;
use std::sync::Arc;

const EXIT_KEYWORDS: &[&str] = &["exit", "quit"];

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for user input
    Idle,
    /// Retrieving context and assembling the prompt
    PromptBuilding,
    /// Issuing the generation request
    Dispatching,
    /// Pulling chunks from a streamed response
    Streaming,
    /// Waiting for a single complete response
    AwaitingBatch,
    /// Response finalized and recorded
    Completed,
    /// Transport or server failure; nothing recorded
    Failed,
}

/// How a raw input line should be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Exit,
    Empty,
    Prompt(String),
}

/// Classify a line of user input. Exit keywords are case-insensitive and
/// ignore surrounding whitespace; prompts are kept verbatim.
pub fn classify_input(raw: &str) -> InputAction {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        InputAction::Empty
    } else if EXIT_KEYWORDS
        .iter()
        .any(|keyword| trimmed.eq_ignore_ascii_case(keyword))
    {
        InputAction::Exit
    } else {
        InputAction::Prompt(raw.to_string())
    }
}

/// Result of one turn.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed(ConversationTurn),
    Failed(NeuraError),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed(_))
    }
}

/// Supplies user input lines.
#[async_trait]
pub trait PromptSource: Send {
    /// The next input line, or `None` once input is closed.
    async fn next_prompt(&mut self) -> Result<Option<String>>;
}

/// Receives progress and results of each turn.
pub trait TurnObserver: Send {
    fn on_state(&mut self, _state: TurnState) {}

    /// A streamed fragment arrived. Does not affect control flow.
    fn on_fragment(&mut self, _fragment: &str) {}

    fn on_empty_input(&mut self) {}

    fn on_complete(&mut self, turn: &ConversationTurn);

    fn on_failed(&mut self, error: &NeuraError);
}

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub streaming: bool,
    /// Snippets requested from the retriever per turn; 0 disables retrieval.
    pub context_results: usize,
}

impl SessionConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            streaming: true,
            context_results: 3,
        }
    }
}

/// Drives turns against a model backend, owning the conversation state.
pub struct ChatSession {
    config: SessionConfig,
    history: ConversationState,
    backend: Arc<dyn ModelBackend>,
    retriever: Option<Arc<dyn ContextRetriever>>,
    sink: Option<Arc<dyn TurnSink>>,
    assembler: PromptAssembler,
    formatter: ContextFormatter,
    state: TurnState,
}

impl ChatSession {
    pub fn new(config: SessionConfig, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            config,
            history: ConversationState::new(),
            backend,
            retriever: None,
            sink: None,
            assembler: PromptAssembler::new(),
            formatter: ContextFormatter::new(),
            state: TurnState::Idle,
        }
    }

    /// Seed the conversation, e.g. from persisted history.
    pub fn with_history(mut self, history: ConversationState) -> Self {
        self.history = history;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TurnSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &ConversationState {
        &self.history
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn transition<O: TurnObserver + ?Sized>(&mut self, next: TurnState, observer: &mut O) {
        tracing::trace!(target: "neura::session", "Turn state {:?} -> {:?}", self.state, next);
        self.state = next;
        observer.on_state(next);
    }

    /// Read and run turns until an exit keyword or end of input.
    ///
    /// Returns the number of turns completed. Turn failures are reported to
    /// the observer and never end the session; only an input error does.
    pub async fn run<P, O>(&mut self, input: &mut P, observer: &mut O) -> Result<usize>
    where
        P: PromptSource + ?Sized,
        O: TurnObserver + ?Sized,
    {
        let mut completed = 0;

        loop {
            self.transition(TurnState::Idle, observer);

            let Some(raw) = input.next_prompt().await? else {
                tracing::info!(target: "neura::session", "Input closed, ending session");
                break;
            };

            match classify_input(&raw) {
                InputAction::Exit => {
                    tracing::info!(target: "neura::session", "Exit requested");
                    break;
                }
                InputAction::Empty => {
                    tracing::debug!(target: "neura::session", "{}", NeuraError::EmptyInput);
                    observer.on_empty_input();
                }
                InputAction::Prompt(prompt) => {
                    if self.run_turn(&prompt, observer).await.is_completed() {
                        completed += 1;
                    }
                }
            }
        }

        self.transition(TurnState::Idle, observer);
        Ok(completed)
    }

    /// Run a single turn for `prompt`.
    ///
    /// A completed turn is appended to the conversation and handed to the
    /// sink; a failed turn leaves both untouched.
    pub async fn run_turn<O: TurnObserver + ?Sized>(
        &mut self,
        prompt: &str,
        observer: &mut O,
    ) -> TurnOutcome {
        self.transition(TurnState::PromptBuilding, observer);
        let full_prompt = self.build_prompt(prompt).await;

        self.transition(TurnState::Dispatching, observer);
        tracing::info!(
            target: "neura::session",
            "Dispatching turn to {} ({})",
            self.config.model,
            if self.config.streaming { "streaming" } else { "batch" }
        );

        let result = if self.config.streaming {
            self.stream_response(&full_prompt, observer).await
        } else {
            self.transition(TurnState::AwaitingBatch, observer);
            self.backend.generate(&self.config.model, &full_prompt).await
        };

        match result {
            Ok(response) => {
                let turn = ConversationTurn::new(prompt, response);
                self.history.append(turn.clone());

                if let Some(sink) = &self.sink {
                    if let Err(e) = sink.record(&turn) {
                        tracing::warn!(target: "neura::history", "Failed to persist turn: {}", e);
                    }
                }

                self.transition(TurnState::Completed, observer);
                tracing::info!(
                    target: "neura::session",
                    "Turn completed ({} response bytes, {} turns in history)",
                    turn.response.len(),
                    self.history.len()
                );
                observer.on_complete(&turn);
                TurnOutcome::Completed(turn)
            }
            Err(e) => {
                tracing::warn!(target: "neura::session", "Turn failed: {}", e);
                self.transition(TurnState::Failed, observer);
                observer.on_failed(&e);
                TurnOutcome::Failed(e)
            }
        }
    }

    /// Assemble the prompt for `prompt`, with retrieved context when available.
    ///
    /// Retrieval errors degrade to no context.
    pub async fn build_prompt(&self, prompt: &str) -> String {
        let context_block = match &self.retriever {
            Some(retriever) if self.config.context_results > 0 => {
                match retriever.search(prompt, self.config.context_results).await {
                    Ok(snippets) => {
                        tracing::debug!(target: "neura::retrieval", "Using {} context snippets", snippets.len());
                        self.formatter.format(&snippets)
                    }
                    Err(e) => {
                        tracing::warn!(
                            target: "neura::retrieval",
                            "Context retrieval unavailable, continuing without context: {}",
                            e
                        );
                        String::new()
                    }
                }
            }
            _ => String::new(),
        };

        self.assembler.assemble(&self.history, prompt, &context_block)
    }

    async fn stream_response<O: TurnObserver + ?Sized>(
        &mut self,
        full_prompt: &str,
        observer: &mut O,
    ) -> Result<String> {
        let mut chunks = self
            .backend
            .generate_stream(&self.config.model, full_prompt)
            .await?;
        self.transition(TurnState::Streaming, observer);

        let mut lines = LineBuffer::new();
        let mut decoder = StreamDecoder::new();
        let mut response = String::new();

        let mut accept = |record: &str, observer: &mut O| {
            if let Some(fragment) = decoder.decode(record) {
                observer.on_fragment(&fragment);
                response.push_str(&fragment);
            }
        };

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            tracing::trace!(target: "neura::stream", "Received {} byte chunk", chunk.len());
            for record in lines.feed(&chunk) {
                accept(&record, &mut *observer);
            }
        }

        if let Some(record) = lines.flush() {
            accept(&record, &mut *observer);
        }

        if decoder.dropped_records() > 0 {
            tracing::debug!(target: "neura::stream", "Dropped {} malformed records", decoder.dropped_records());
        }

        if let Some(message) = decoder.take_error() {
            return Err(NeuraError::Upstream(message));
        }

        Ok(response)
    }
}
