//! Client configuration.

use anyhow::{Context, Result};
use neura_core::{HistoryFile, OllamaClient, RetrievalConfig, RetryPolicy};
use neura_types::{default_catalog, ModelChoice};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_catalog")]
    pub models: Vec<ModelChoice>,
    #[serde(default)]
    pub retrieval: RetrievalSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSection {
    #[serde(default = "default_retrieval_enabled")]
    pub enabled: bool,
    #[serde(default = "default_chroma_url")]
    pub chroma_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_results")]
    pub results: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_ollama_url() -> String {
    OllamaClient::DEFAULT_URL.to_string()
}

fn default_stream() -> bool {
    true
}

fn default_history_path() -> PathBuf {
    PathBuf::from(HistoryFile::DEFAULT_FILE_NAME)
}

fn default_retrieval_enabled() -> bool {
    true
}

fn default_chroma_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_collection() -> String {
    "codebase_context".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_results() -> usize {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            enabled: default_retrieval_enabled(),
            chroma_url: default_chroma_url(),
            collection: default_collection(),
            embedding_model: default_embedding_model(),
            results: default_results(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            default_model: None,
            stream: default_stream(),
            history_path: default_history_path(),
            request_timeout_secs: None,
            models: default_catalog(),
            retrieval: RetrievalSection::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `neura.toml` from the working directory, then the user config
    /// directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                tracing::debug!(target: "neura::startup", "Using config {}", path.display());
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("neura.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("neura").join("config.toml"));
        }
        paths
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Chroma settings, sharing the request timeout with the model server.
    pub fn retrieval_config(&self) -> RetrievalConfig {
        let section = &self.retrieval;
        RetrievalConfig {
            chroma_url: section.chroma_url.clone(),
            collection: section.collection.clone(),
            embedding_model: section.embedding_model.clone(),
            retry: RetryPolicy {
                max_attempts: section.max_retries,
                delay: Duration::from_millis(section.retry_delay_ms),
            },
            timeout: self.request_timeout(),
        }
    }
}
