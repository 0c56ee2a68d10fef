use crate::state::AppState;
use axum::{Router, routing::post};

pub mod form;
pub mod post;

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/all", post(post::upload_all))
        .route("/rubric", post(post::upload_rubric))
        .route("/gradebook", post(post::upload_gradebook))
        .route("/group", post(post::upload_group))
}
