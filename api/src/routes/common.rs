use crate::response::error_response;
use axum::{http::StatusCode, response::Response};
use chrono::{NaiveDate, NaiveDateTime};
use services::ServiceError;
use tracing::error;

/// Maps a pipeline error to its HTTP status.
pub fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::InvalidArchive(msg) => {
            error_response(StatusCode::BAD_REQUEST, format!("Invalid zip file: {msg}"))
        }
        ServiceError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        ServiceError::Conflict(msg) => {
            error_response(StatusCode::CONFLICT, format!("Database integrity error: {msg}"))
        }
        ServiceError::Io(e) => {
            error!("I/O failure: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process files")
        }
        ServiceError::Db(e) => {
            error!("Database failure: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// `YYYY-MM-DD` at midnight.
pub fn parse_due_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}
