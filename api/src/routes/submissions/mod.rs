use crate::state::AppState;
use axum::{Router, routing::patch};

pub mod patch;

pub fn submissions_routes() -> Router<AppState> {
    Router::new().route("/{id}", patch(patch::patch_submission))
}
