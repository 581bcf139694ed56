//! Prompt assembly from history, context and the new input.

use crate::ConversationState;

/// Number of most recent turns included verbatim in each prompt.
pub const LOOKBACK_WINDOW: usize = 3;

/// Builds the exact text sent to the model.
#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler {
    window: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            window: LOOKBACK_WINDOW,
        }
    }
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble `[context]\n\n` + recent `User:`/`AI:` pairs + `User: <new>\nAI:`.
    ///
    /// The trailing `AI:` carries nothing after it; the model continues from there.
    pub fn assemble(
        &self,
        history: &ConversationState,
        new_prompt: &str,
        context_block: &str,
    ) -> String {
        let mut prompt = String::new();

        if !context_block.is_empty() {
            prompt.push_str(context_block);
            prompt.push_str("\n\n");
        }

        for turn in history.recent(self.window) {
            prompt.push_str("User: ");
            prompt.push_str(&turn.prompt);
            prompt.push_str("\nAI: ");
            prompt.push_str(&turn.response);
            prompt.push('\n');
        }

        prompt.push_str("User: ");
        prompt.push_str(new_prompt);
        prompt.push_str("\nAI:");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neura_types::ConversationTurn;

    #[test]
    fn test_empty_history_and_context() {
        let prompt = PromptAssembler::new().assemble(&ConversationState::new(), "hello", "");
        assert_eq!(prompt, "User: hello\nAI:");
    }

    #[test]
    fn test_only_last_three_turns_are_used() {
        let mut history = ConversationState::new();
        for i in 1..=5 {
            history.append(ConversationTurn::new(format!("q{i}"), format!("a{i}")));
        }

        let prompt = PromptAssembler::new().assemble(&history, "next", "");
        assert_eq!(
            prompt,
            "User: q3\nAI: a3\nUser: q4\nAI: a4\nUser: q5\nAI: a5\nUser: next\nAI:"
        );
    }

    #[test]
    fn test_context_block_is_prepended() {
        let mut history = ConversationState::new();
        history.append(ConversationTurn::new("q", "a"));

        let prompt = PromptAssembler::new().assemble(&history, "next", "File: x (code, last modified: t)\nbody");
        assert_eq!(
            prompt,
            "File: x (code, last modified: t)\nbody\n\nUser: q\nAI: a\nUser: next\nAI:"
        );
    }
}
