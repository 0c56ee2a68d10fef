use crate::response::{ApiResponse, error_response};
use crate::routes::common::service_error_response;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use code_runner::RunnerError;
use db::models::submission::Model as SubmissionModel;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub assignment_id: i64,
    pub submissions: usize,
}

/// POST /api/grade/assignments/{assignment_id}/process
///
/// Starts regenerating every report of the assignment in the background and
/// returns immediately. Poll the individual report endpoint for results.
///
/// ### Responses
/// - `202 Accepted`
/// - `404 Not Found` when the assignment does not exist or has no submissions
pub async fn process_assignment(
    State(app_state): State<AppState>,
    Path(assignment_id): Path<i64>,
) -> Result<Response, Response> {
    let submissions = SubmissionModel::list_for_assignment(app_state.db(), assignment_id)
        .await
        .map_err(|e| service_error_response(e.into()))?;
    if submissions.is_empty() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "No submissions found for this assignment",
        ));
    }

    match app_state.batch().dispatch(app_state.db(), assignment_id).await {
        // Fire-and-forget: the handle is dropped, the batch keeps running.
        Ok(_handle) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(
                ProcessResponse {
                    assignment_id,
                    submissions: submissions.len(),
                },
                "Processing started",
            )),
        )
            .into_response()),
        Err(RunnerError::AssignmentNotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, "Assignment not found"))
        }
        Err(e) => {
            error!("Could not start batch for assignment {assignment_id}: {e}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start processing",
            ))
        }
    }
}
