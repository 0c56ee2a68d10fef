use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

const DATE_FORMAT: &str = "%A, %B %d, %Y %I:%M:%S %p";

static DATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Date Submitted:\s+(.*)\s+[A-Z]{3,4}$").unwrap());

/// Finds the first `Date Submitted: <weekday>, <month> <dd>, <yyyy> <hh:mm:ss> <AM|PM> <TZ>`
/// line and parses its timestamp. The timezone is dropped.
///
/// Only the first marker line is considered; if it does not parse the result
/// is `None`.
pub fn parse_submission_date(text: &str) -> Option<NaiveDateTime> {
    let caps = text.lines().find_map(|line| DATE_MARKER.captures(line.trim_end()))?;
    let raw = caps.get(1)?.as_str().trim();

    match NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("Unparseable submission date '{raw}': {err}");
            None
        }
    }
}

/// Reads a submission log from disk; unreadable files yield `None`.
pub async fn read_submission_date(path: &Path) -> Option<NaiveDateTime> {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_submission_date(&String::from_utf8_lossy(&bytes)),
        Err(err) => {
            warn!("Could not read submission log {}: {err}", path.display());
            None
        }
    }
}
