//! Retrieved context snippets.

use serde::{Deserialize, Serialize};

/// A piece of retrieved content relevant to the current prompt.
///
/// Metadata fields are optional because the vector store may return records
/// without them; formatting renders the gaps explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub content: String,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl ContextSnippet {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: impl Into<String>) -> Self {
        self.last_modified = Some(last_modified.into());
        self
    }
}
