use crate::response::error_response;
use crate::routes::common::service_error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use code_runner::{ReportMeta, ReportRequest, Rubric};
use db::models::{
    assignment::Model as AssignmentModel, student::Model as StudentModel,
    submission::Model as SubmissionModel,
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub force_rerender: bool,
}

/// GET /api/grade/assignments/{assignment_id}/students/{user_id}/submission
///
/// Returns the student's HTML report, running the rubric only when the cached
/// `result.html` is older than the submission or `force_rerender=true`.
///
/// ### Responses
/// - `200 OK` (`text/html`)
/// - `404 Not Found` when the student, assignment, submission or its files are missing
/// - `500 Internal Server Error` when the stored rubric is unusable or rendering fails
pub async fn get_submission_report(
    State(app_state): State<AppState>,
    Path((assignment_id, user_id)): Path<(i64, String)>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Response> {
    let db = app_state.db();
    let db_error = |e: db::DbErr| service_error_response(e.into());

    let student = StudentModel::get_by_user_id(db, &user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Student not found"))?;
    let assignment = AssignmentModel::get_by_id(db, assignment_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Assignment not found"))?;
    let submission = SubmissionModel::find_for_student(db, assignment_id, &user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Submission not found"))?;

    let student_dir = PathBuf::from(&submission.file_path);
    if !student_dir.is_dir() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Submission files not found",
        ));
    }

    let rubric = Rubric::try_from(&assignment.rubric).map_err(|e| {
        error!("Assignment {assignment_id} has an unusable rubric: {e}");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Stored rubric is invalid")
    })?;

    let request = ReportRequest {
        student_dir,
        rubric,
        meta: ReportMeta::from_models(&assignment, Some(&student), &submission),
    };

    let report = app_state
        .reports()
        .get_or_render(&request, query.force_rerender)
        .await
        .map_err(|e| {
            error!("Report for {user_id} on assignment {assignment_id} failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate report")
        })?;

    Ok(Html(report.html).into_response())
}
