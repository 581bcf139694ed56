//! Code detection and snippet saving for rendered responses.

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Decides whether a response should be treated as code.
pub trait CodeClassifier: Send + Sync {
    fn is_code(&self, text: &str) -> bool;
}

/// Flags text containing any of a fixed set of markers.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    markers: Vec<String>,
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(["```", "function", "class"])
    }
}

impl MarkerClassifier {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }
}

impl CodeClassifier for MarkerClassifier {
    fn is_code(&self, text: &str) -> bool {
        self.markers.iter().any(|marker| text.contains(marker.as_str()))
    }
}

/// A fence line with its optional language tag, or a stray inline fence.
static FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[\w+#.-]*[ \t]*\r?\n?|```").unwrap());

static FENCE_LANGUAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```([\w+#.-]+)").unwrap());

/// Remove markdown code fences and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_REGEX.replace_all(text, "").trim().to_string()
}

/// Language tag of the first fenced block, e.g. `rust` for ```` ```rust ````.
pub fn fence_language(text: &str) -> Option<&str> {
    FENCE_LANGUAGE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Write a snippet to `path`, creating parent directories as needed.
pub fn save_snippet(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, code)?;
    tracing::info!(target: "neura::session", "Saved snippet to {}", path.display());
    Ok(())
}
