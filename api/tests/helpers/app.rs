use api::{routes::routes, state::AppState};
use axum::{Router, response::Response};
use code_runner::{CodeHighlighter, HtmlReportRenderer, ReportCache};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use util::execution_limits::ExecutionLimits;

/// Report cache that runs rubric scripts with `sh` so tests need no Python.
fn sh_cache() -> Arc<ReportCache> {
    Arc::new(ReportCache::new(
        Arc::new(HtmlReportRenderer),
        Arc::new(CodeHighlighter::new()),
        ExecutionLimits::default()
            .with_interpreter("sh")
            .with_timeout_secs(5),
    ))
}

pub fn make_app(db: DatabaseConnection) -> Router {
    Router::new()
        .nest("/api", routes())
        .with_state(AppState::with_cache(db, sh_cache(), 2))
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
