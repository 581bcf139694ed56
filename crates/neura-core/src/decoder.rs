//! Decoder for newline-delimited `/api/generate` stream records.

use neura_types::GenerateRecord;

/// Turns complete stream records into text fragments.
///
/// Records that fail to parse are dropped without aborting the stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Set once a record reports `done` or an error.
    finished: bool,
    /// Error message reported by the server, if any.
    error: Option<String>,
    /// Count of records dropped as malformed.
    dropped: usize,
}

impl StreamDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one record into its text fragment, if it carries one.
    pub fn decode(&mut self, record: &str) -> Option<String> {
        let trimmed = record.trim();
        if trimmed.is_empty() {
            return None;
        }

        if self.finished {
            tracing::trace!(target: "neura::stream", "Ignoring record after end of stream: {}", trimmed);
            return None;
        }

        let event = match serde_json::from_str::<GenerateRecord>(trimmed) {
            Ok(event) => event,
            Err(e) => {
                // Partial or garbled record, most likely a boundary misalignment upstream
                self.dropped += 1;
                tracing::debug!(target: "neura::stream", "Dropping malformed record: {}: {}", e, trimmed);
                return None;
            }
        };

        if let Some(message) = event.error {
            tracing::warn!(target: "neura::stream", "Model server reported an error: {}", message);
            self.error = Some(message);
            self.finished = true;
            return None;
        }

        if event.done {
            self.finished = true;
        }

        event.response.filter(|text| !text.is_empty())
    }

    /// Whether a completion or error record has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Take the server-reported error, if one arrived.
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// Number of malformed records dropped so far.
    pub fn dropped_records(&self) -> usize {
        self.dropped
    }
}
