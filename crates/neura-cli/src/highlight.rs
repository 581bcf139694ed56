//! Terminal syntax highlighting for code responses.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// Used when a response has no fence tag; most answers are TypeScript.
const DEFAULT_LANGUAGE: &str = "typescript";

const RESET: &str = "\x1b[0m";

/// The bundled syntaxes have no TypeScript, so it shares JavaScript's.
fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    let token = match language.to_ascii_lowercase().as_str() {
        "ts" | "tsx" | "typescript" | "jsx" => "js".to_string(),
        other => other.to_string(),
    };
    SYNTAXES.find_syntax_by_token(&token)
}

/// Highlight `code` with ANSI colors. Falls back to the plain text if the
/// theme is missing or a line fails to parse.
pub fn highlight_code(code: &str, language: Option<&str>) -> String {
    let syntax = syntax_for(language.unwrap_or(DEFAULT_LANGUAGE))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
    let Some(theme) = THEMES.themes.get(THEME) else {
        tracing::debug!(target: "neura::session", "Theme {} not bundled", THEME);
        return code.to_string();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &SYNTAXES) {
            Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
            Err(e) => {
                tracing::debug!(target: "neura::session", "Highlighting failed: {}", e);
                return code.to_string();
            }
        }
    }
    out.push_str(RESET);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_keeps_text() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let highlighted = highlight_code(code, Some("rust"));

        assert!(highlighted.contains("\x1b["));
        assert_eq!(console::strip_ansi_codes(&highlighted), code);
    }

    #[test]
    fn test_typescript_uses_javascript_syntax() {
        assert_eq!(syntax_for("ts").map(|s| s.name.as_str()), Some("JavaScript"));
        assert_eq!(syntax_for("TypeScript").map(|s| s.name.as_str()), Some("JavaScript"));
        assert_eq!(syntax_for("rust").map(|s| s.name.as_str()), Some("Rust"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        assert!(syntax_for("no-such-lang").is_none());
        let highlighted = highlight_code("just words", Some("no-such-lang"));
        assert_eq!(console::strip_ansi_codes(&highlighted), "just words");
    }
}
