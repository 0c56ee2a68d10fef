use tracing::warn;

/// Renders terminal colour codes in script output as HTML spans.
///
/// The result is already HTML-escaped. Malformed escape sequences fall back
/// to plain escaped text.
pub fn ansi_to_html(text: &str) -> String {
    match ansi_to_html::convert(text) {
        Ok(html) => html,
        Err(err) => {
            warn!("Could not convert ANSI output to HTML: {err}");
            htmlescape::encode_minimal(text)
        }
    }
}

/// Keeps only the last `max_lines` lines of `text`.
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
