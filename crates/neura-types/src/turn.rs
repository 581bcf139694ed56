//! Conversation turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user prompt and the model response it produced.
///
/// Turns are only built once a response has completed; nothing mutates them
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The literal user input.
    pub prompt: String,
    /// The full response text, fragments concatenated in arrival order.
    pub response: String,
    /// When the response completed. Older history files carry no timestamp.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}
