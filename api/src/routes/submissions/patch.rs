use crate::response::{ApiResponse, error_response};
use crate::routes::common::service_error_response;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use db::models::submission::{Model as SubmissionModel, SubmissionPatch};

/// PATCH /api/submissions/{id}
///
/// ### Request Body (JSON)
/// Any of `grade` (number), `feedback` (object), `test_cases` (object).
/// Absent fields are left unchanged.
///
/// ### Responses
/// - `200 OK` with the updated submission
/// - `400 Bad Request` when the body names no field
/// - `404 Not Found`
pub async fn patch_submission(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<SubmissionPatch>,
) -> Result<Response, Response> {
    if patch.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "At least one of grade, feedback or test_cases is required",
        ));
    }

    match SubmissionModel::apply_patch(app_state.db(), id, patch).await {
        Ok(updated) => Ok((
            StatusCode::OK,
            Json(ApiResponse::success(updated, "Submission updated successfully")),
        )
            .into_response()),
        Err(DbErr::RecordNotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, "Submission not found"))
        }
        Err(e) => Err(service_error_response(e.into())),
    }
}
