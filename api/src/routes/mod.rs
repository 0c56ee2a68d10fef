//! HTTP route entry point for `/api/...`.
//!
//! - `/upload` → rubric, gradebook and roster uploads
//! - `/grade` → per-student reports and batch regeneration
//! - `/submissions` → grader edits to a submission

use crate::routes::{
    grade::grade_routes, submissions::submissions_routes, upload::upload_routes,
};
use crate::state::AppState;
use axum::Router;

pub mod common;
pub mod grade;
pub mod submissions;
pub mod upload;

/// Builds the router mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/upload", upload_routes())
        .nest("/grade", grade_routes())
        .nest("/submissions", submissions_routes())
}
