//! Persisted chat history file.

use crate::Result;
use neura_types::ConversationTurn;
use std::path::{Path, PathBuf};

/// Receives completed turns, in completion order.
pub trait TurnSink: Send + Sync {
    fn record(&self, turn: &ConversationTurn) -> Result<()>;
}

/// JSON array of turns on disk.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub const DEFAULT_FILE_NAME: &'static str = ".chat_history.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all persisted turns, oldest first. A missing or unreadable file
    /// yields an empty history.
    pub fn load(&self) -> Vec<ConversationTurn> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(target: "neura::history", "Failed to read {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(target: "neura::history", "Ignoring unparsable history {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

impl TurnSink for HistoryFile {
    fn record(&self, turn: &ConversationTurn) -> Result<()> {
        let mut turns = self.load();
        turns.push(turn.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&turns)?)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(target: "neura::history", "Saved turn {} to {}", turns.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let history = HistoryFile::new(dir.path().join("none.json"));
        assert!(history.load().is_empty());
    }

    #[test]
    fn test_record_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let history = HistoryFile::new(dir.path().join("nested/history.json"));

        history.record(&ConversationTurn::new("first", "one")).unwrap();
        history.record(&ConversationTurn::new("second", "two")).unwrap();

        let turns = history.load();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].prompt, "first");
        assert_eq!(turns[1].response, "two");
    }

    #[test]
    fn test_legacy_file_without_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HistoryFile::DEFAULT_FILE_NAME);
        std::fs::write(&path, r#"[{"prompt":"old","response":"reply"}]"#).unwrap();

        let turns = HistoryFile::new(&path).load();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].prompt, "old");
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(HistoryFile::new(&path).load().is_empty());
    }
}
