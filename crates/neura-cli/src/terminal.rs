//! Terminal prompts, progress spinner and response rendering.

use async_trait::async_trait;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use crate::highlight::highlight_code;
use neura_core::{
    fence_language, save_snippet, strip_code_fences, CodeClassifier, MarkerClassifier, NeuraError,
    PromptSource, TurnObserver, TurnState,
};
use neura_types::{ConversationTurn, ModelChoice};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

const THINKING_MESSAGES: &[&str] = &[
    "🤖 Analyzing your prompt...",
    "🧠 Deep in thought...",
    "⏳ Crunching some data...",
    "⚙️ Fine-tuning the model...",
    "💡 Almost there...",
];

const MESSAGE_INTERVAL: Duration = Duration::from_secs(3);

/// Characters of streamed text shown next to the spinner.
const PREVIEW_CHARS: usize = 20;

pub fn print_welcome() {
    println!(
        "{}\n",
        style("🚀 Welcome to Neura CLI - Your AI coding companion").cyan().bright()
    );
}

pub fn print_hint() {
    println!(
        "{}\n",
        style("Type your prompt below. Type 'exit' or 'quit' to end.").dim()
    );
}

pub fn print_goodbye() {
    println!("{}", style("👋 Goodbye!").cyan());
}

pub fn print_warning(message: &str) {
    eprintln!("{}", style(format!("⚠️  {}", message)).yellow());
}

pub fn print_info(message: &str) {
    println!("{}", style(message).green());
}

/// Ask the user to pick one of `choices`.
pub fn select_model(choices: &[ModelChoice]) -> anyhow::Result<ModelChoice> {
    let names: Vec<&str> = choices.iter().map(|c| c.name.as_str()).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select which model to use:")
        .items(&names)
        .default(0)
        .interact()?;
    Ok(choices[index].clone())
}

pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Reads prompts from the terminal.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PromptSource for TerminalInput {
    async fn next_prompt(&mut self) -> neura_core::Result<Option<String>> {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(style("You:").yellow().to_string())
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| NeuraError::Io(std::io::Error::other(e)))?;

        match line {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C / Ctrl-D end the session like an exit keyword
            Err(dialoguer::Error::IO(e))
                if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::UnexpectedEof) =>
            {
                Ok(None)
            }
            Err(dialoguer::Error::IO(e)) => Err(NeuraError::Io(e)),
        }
    }
}

/// Shows turn progress and renders results.
pub struct TerminalObserver {
    spinner: Option<ProgressBar>,
    ticker: Option<JoinHandle<()>>,
    streamed: String,
    classifier: Box<dyn CodeClassifier>,
    /// Offer to save code responses to a file.
    offer_save: bool,
}

impl TerminalObserver {
    pub fn new(offer_save: bool) -> Self {
        Self {
            spinner: None,
            ticker: None,
            streamed: String::new(),
            classifier: Box::new(MarkerClassifier::default()),
            offer_save,
        }
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(THINKING_MESSAGES[0]);
        spinner.enable_steady_tick(Duration::from_millis(100));

        let cycling = spinner.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut index = 0;
            loop {
                tokio::time::sleep(MESSAGE_INTERVAL).await;
                index = (index + 1) % THINKING_MESSAGES.len();
                cycling.set_message(THINKING_MESSAGES[index]);
            }
        }));
        self.spinner = Some(spinner);
        self.streamed.clear();
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn finish_spinner(&mut self, message: &'static str, success: bool) {
        self.stop_ticker();
        if let Some(spinner) = self.spinner.take() {
            if success {
                spinner.finish_with_message(message);
            } else {
                spinner.abandon_with_message(message);
            }
        }
    }

    fn render(&self, response: &str) -> bool {
        let is_code = self.classifier.is_code(response);
        if is_code {
            println!("{}", style("\n--- AI Code Response ---\n").green().bright());
            let code = strip_code_fences(response);
            if console::colors_enabled() {
                println!("{}", highlight_code(&code, fence_language(response)));
            } else {
                println!("{}", code);
            }
        } else {
            println!("{}", style("\n--- AI Response ---\n").green().bright());
            println!("{}", response);
        }
        println!("{}", style("\n-------------------\n").green().bright());
        is_code
    }

    fn offer_to_save(&self, response: &str) {
        let result = tokio::task::block_in_place(|| -> anyhow::Result<Option<PathBuf>> {
            if !confirm("Save this code snippet to a file?", false)? {
                return Ok(None);
            }
            let filename: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter filename (e.g. snippet.ts):")
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.trim().is_empty() {
                        Err("Filename cannot be empty")
                    } else {
                        Ok(())
                    }
                })
                .interact_text()?;
            Ok(Some(PathBuf::from(filename.trim())))
        });

        match result {
            Ok(Some(path)) => match save_snippet(&path, &strip_code_fences(response)) {
                Ok(()) => print_info(&format!("✅ Code saved to {}", path.display())),
                Err(e) => eprintln!("{}", style(format!("❌ Failed to save the file: {}", e)).red()),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(target: "neura::session", "Save prompt failed: {}", e),
        }
    }
}

impl TurnObserver for TerminalObserver {
    fn on_state(&mut self, state: TurnState) {
        if state == TurnState::PromptBuilding {
            self.start_spinner();
        }
    }

    fn on_fragment(&mut self, fragment: &str) {
        // Live text replaces the canned messages
        self.stop_ticker();
        self.streamed.push_str(fragment);
        if let Some(spinner) = &self.spinner {
            let preview = tail_preview(&self.streamed, PREVIEW_CHARS);
            if preview.is_empty() {
                spinner.set_message("🤖 Thinking...");
            } else {
                spinner.set_message(preview);
            }
        }
    }

    fn on_empty_input(&mut self) {
        println!("{}", style("Please enter something").red());
    }

    fn on_complete(&mut self, turn: &ConversationTurn) {
        self.finish_spinner("✅ Response complete!", true);
        let is_code = self.render(&turn.response);
        if is_code && self.offer_save {
            self.offer_to_save(&turn.response);
        }
    }

    fn on_failed(&mut self, error: &NeuraError) {
        self.finish_spinner("❌ Failed to generate response", false);
        eprintln!("{}", style(error).red());
    }
}

impl Drop for TerminalObserver {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Last `n` characters of `text`, trimmed and flattened onto one line.
fn tail_preview(text: &str, n: usize) -> String {
    let trimmed = text.trim();
    let skip = trimmed.chars().count().saturating_sub(n);
    trimmed
        .chars()
        .skip(skip)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_preview_keeps_last_chars() {
        assert_eq!(tail_preview("  short  ", 20), "short");
        assert_eq!(tail_preview("abcdefghijklmnopqrstuvwxyz", 5), "vwxyz");
        assert_eq!(tail_preview("line one\nline two", 8), "line two");
        assert_eq!(tail_preview("   ", 20), "");
    }

    #[test]
    fn test_tail_preview_counts_chars_not_bytes() {
        assert_eq!(tail_preview("日本語のテキスト", 3), "キスト");
    }
}
