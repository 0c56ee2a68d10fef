use std::path::Path;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use tracing::warn;

const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Syntax highlighter for source listings in reports.
///
/// Loading the syntax and theme sets is slow, so one instance is built at
/// start-up and shared.
pub struct CodeHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Default for CodeHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter {
    pub fn new() -> Self {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(DEFAULT_THEME).unwrap_or_default();
        Self { syntaxes, theme }
    }

    /// Highlights `source`, picking the grammar from `file_name`'s extension.
    pub fn highlight(&self, file_name: &str, source: &str) -> String {
        let syntax = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.syntaxes.find_syntax_by_extension(ext))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        match highlighted_html_for_string(source, &self.syntaxes, syntax, &self.theme) {
            Ok(html) => html,
            Err(err) => {
                warn!("Highlighting {file_name} failed: {err}");
                format!("<pre>{}</pre>", htmlescape::encode_minimal(source))
            }
        }
    }
}
