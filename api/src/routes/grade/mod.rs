use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod get;
pub mod post;

pub fn grade_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/assignments/{assignment_id}/students/{user_id}/submission",
            get(get::get_submission_report),
        )
        .route(
            "/assignments/{assignment_id}/process",
            post(post::process_assignment),
        )
}
