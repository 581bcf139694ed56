//! Neura - interactive coding assistant backed by a local Ollama server.

use anyhow::{bail, Result};
use clap::Parser;
use neura_cli::{config, logging, terminal};
use neura_core::{
    ChatSession, ChromaRetriever, ConversationState, HistoryFile, OllamaClient, SessionConfig,
};
use neura_types::{filter_installed, ModelChoice};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use terminal::{TerminalInput, TerminalObserver};

/// Neura - chat with a local model about your code.
#[derive(Parser, Debug)]
#[command(name = "neura")]
#[command(about = "Interactive AI coding companion for a local Ollama server")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model to use, skipping the selection prompt
    #[arg(short, long)]
    model: Option<String>,

    /// Stream responses as they are generated
    #[arg(long, conflicts_with = "no_stream")]
    stream: bool,

    /// Wait for complete responses
    #[arg(long)]
    no_stream: bool,

    /// Disable codebase context retrieval
    #[arg(long)]
    no_context: bool,

    /// Index a directory into the context store before chatting
    #[arg(long, value_name = "DIR")]
    index: Option<PathBuf>,

    /// Accept defaults instead of asking
    #[arg(short, long)]
    yes: bool,

    /// Start without loading saved history
    #[arg(long)]
    fresh: bool,

    /// Enable verbose logging (turn lifecycle and indexing)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (includes per-chunk stream traces)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "stream=trace" or "retrieval=debug")
    /// Can be specified multiple times. Targets are prefixed with "neura::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides.clone(),
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.no_context {
        config.retrieval.enabled = false;
    }

    terminal::print_welcome();

    let client = Arc::new(OllamaClient::new(&config.ollama_url, config.request_timeout())?);
    let installed = match client.list_models().await {
        Ok(models) => models,
        Err(e) => bail!(
            "Could not reach Ollama at {}: {}. Is `ollama serve` running?",
            client.base_url(),
            e
        ),
    };
    tracing::info!(target: "neura::model", "{} models installed", installed.len());

    let model = choose_model(&cli, &config, &installed)?;
    let streaming = choose_streaming(&cli, &config)?;
    tracing::info!(
        target: "neura::startup",
        "Using model {} ({})",
        model,
        if streaming { "streaming" } else { "batch" }
    );

    let retriever = if config.retrieval.enabled {
        connect_retriever(&config, client.clone(), cli.index.as_deref(), cli.yes).await
    } else {
        tracing::info!(target: "neura::retrieval", "Context retrieval disabled");
        None
    };

    let history_file = Arc::new(HistoryFile::new(&config.history_path));
    let history = if cli.fresh {
        ConversationState::new()
    } else {
        ConversationState::from_turns(history_file.load())
    };
    if !history.is_empty() {
        tracing::info!(target: "neura::history", "Resuming with {} saved turns", history.len());
    }

    let session_config = SessionConfig {
        model,
        streaming,
        context_results: if retriever.is_some() {
            config.retrieval.results
        } else {
            0
        },
    };

    let mut session = ChatSession::new(session_config, client)
        .with_history(history)
        .with_sink(history_file);
    if let Some(retriever) = retriever {
        session = session.with_retriever(retriever);
    }

    terminal::print_hint();

    let mut input = TerminalInput::new();
    let mut observer = TerminalObserver::new(!cli.yes);
    let completed = session.run(&mut input, &mut observer).await?;

    tracing::info!(target: "neura::session", "Session ended after {} turns", completed);
    terminal::print_goodbye();
    Ok(())
}

/// `--model` wins, then a configured default that is installed, then the
/// first installed catalog entry under `--yes`, otherwise ask.
fn choose_model(cli: &Cli, config: &Config, installed: &[String]) -> Result<String> {
    if let Some(model) = &cli.model {
        return Ok(model.clone());
    }

    let available: Vec<ModelChoice> = filter_installed(&config.models, installed);
    if available.is_empty() {
        bail!("No supported models are installed. Install one with e.g. `ollama pull deepseek-r1:1.5b`.");
    }

    if let Some(default) = &config.default_model {
        if let Some(choice) = available.iter().find(|c| &c.value == default) {
            return Ok(choice.value.clone());
        }
        tracing::warn!(target: "neura::model", "Configured model {} is not installed", default);
    }

    if cli.yes {
        return Ok(available[0].value.clone());
    }

    Ok(terminal::select_model(&available)?.value)
}

fn choose_streaming(cli: &Cli, config: &Config) -> Result<bool> {
    if cli.stream {
        Ok(true)
    } else if cli.no_stream {
        Ok(false)
    } else if cli.yes {
        Ok(config.stream)
    } else {
        terminal::confirm("Stream responses as they are generated?", config.stream)
    }
}

/// Connect to the context store and optionally index a directory.
///
/// Any failure here leaves the session running without context.
async fn connect_retriever(
    config: &Config,
    client: Arc<OllamaClient>,
    index: Option<&Path>,
    assume_yes: bool,
) -> Option<Arc<ChromaRetriever>> {
    let retrieval = config.retrieval_config();
    let retriever = match ChromaRetriever::connect(&retrieval, client).await {
        Ok(retriever) => retriever,
        Err(e) => {
            tracing::warn!(target: "neura::retrieval", "Chroma connection failed: {}", e);
            terminal::print_warning(&format!(
                "Context store at {} is unavailable, continuing without context",
                retrieval.chroma_url
            ));
            return None;
        }
    };

    let root = match index {
        Some(dir) => Some(dir.to_path_buf()),
        None if !assume_yes => match terminal::confirm("Index the current directory for context?", false) {
            Ok(true) => std::env::current_dir().ok(),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(target: "neura::index", "Index prompt failed: {}", e);
                None
            }
        },
        None => None,
    };

    if let Some(root) = root {
        match retriever.index_codebase(&root).await {
            Ok(report) => terminal::print_info(&format!(
                "✅ Indexed {} files from {} ({} failed)",
                report.indexed,
                root.display(),
                report.failed
            )),
            Err(e) => terminal::print_warning(&format!("Indexing failed: {}", e)),
        }
    }

    Some(Arc::new(retriever))
}
