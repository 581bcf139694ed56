//! Rendering of retrieved snippets into a prompt preamble.

use neura_types::ContextSnippet;

const UNKNOWN: &str = "unknown";

/// Renders retrieved snippets as one text block, in relevance order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextFormatter;

impl ContextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render snippets as header + content pairs separated by a blank line.
    ///
    /// Returns an empty string for no snippets, meaning "no context".
    pub fn format(&self, snippets: &[ContextSnippet]) -> String {
        snippets
            .iter()
            .map(|snippet| {
                format!(
                    "File: {} ({}, last modified: {})\n{}",
                    field_or_unknown(&snippet.source_path),
                    field_or_unknown(&snippet.kind),
                    field_or_unknown(&snippet.last_modified),
                    snippet.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn field_or_unknown(field: &Option<String>) -> &str {
    field
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_formats_to_empty_string() {
        assert_eq!(ContextFormatter::new().format(&[]), "");
    }

    #[test]
    fn test_single_snippet_has_header_and_content_only() {
        let snippet = ContextSnippet::new("fn main() {}")
            .with_source("src/main.rs")
            .with_kind("code")
            .with_last_modified("2024-05-01T10:00:00Z");

        let block = ContextFormatter::new().format(&[snippet]);
        assert_eq!(
            block,
            "File: src/main.rs (code, last modified: 2024-05-01T10:00:00Z)\nfn main() {}"
        );
    }

    #[test]
    fn test_missing_metadata_renders_unknown() {
        let snippet = ContextSnippet::new("body").with_kind("");
        let block = ContextFormatter::new().format(&[snippet]);
        assert_eq!(block, "File: unknown (unknown, last modified: unknown)\nbody");
    }

    #[test]
    fn test_snippets_keep_retrieval_order() {
        let snippets = vec![
            ContextSnippet::new("first").with_source("b.rs"),
            ContextSnippet::new("second").with_source("a.rs"),
        ];
        let block = ContextFormatter::new().format(&snippets);
        assert_eq!(
            block,
            "File: b.rs (unknown, last modified: unknown)\nfirst\n\n\
             File: a.rs (unknown, last modified: unknown)\nsecond"
        );
    }
}
