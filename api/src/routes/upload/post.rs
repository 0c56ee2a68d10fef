use super::form::{UploadForm, UploadedFile};
use crate::response::{ApiResponse, error_response};
use crate::routes::common::{parse_due_date, service_error_response};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use code_runner::Rubric;
use db::models::assignment::Model as AssignmentModel;
use serde::Serialize;
use serde_json::Value;
use services::archive::check_archive_bytes;
use services::gradebook::ingest_gradebook;
use services::organizer::OrganizeSummary;
use services::roster::{RosterImport, import_roster, parse_roster};
use std::path::PathBuf;
use tracing::{error, info};
use util::paths;

#[derive(Debug, Serialize)]
pub struct AssignmentUploadResponse {
    pub assignment_id: i64,
    pub assignment_name: String,
    pub due_date: NaiveDateTime,
    pub organize: Option<OrganizeSummary>,
}

/// Validated assignment fields shared by `/all` and `/rubric`.
struct AssignmentForm {
    id: i64,
    name: String,
    due_date: NaiveDateTime,
    rubric: Value,
}

fn assignment_fields(form: &UploadForm) -> Result<AssignmentForm, Response> {
    let id = form.id("assignment_id")?;
    let name = form.text("assignment_name")?.to_string();
    let due_date = parse_due_date(form.text("due_date")?)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Invalid due date format"))?;

    let rubric_file = form.file("rubric_file", "json")?;
    let rubric: Value = serde_json::from_slice(&rubric_file.bytes).map_err(|_| {
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON format in the rubric file")
    })?;
    Rubric::try_from(&rubric).map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(AssignmentForm {
        id,
        name,
        due_date,
        rubric,
    })
}

/// The `.zip` field, opened and validated in memory so a bad archive is
/// rejected before any row or file is written.
fn gradebook_field<'a>(
    app_state: &AppState,
    form: &'a UploadForm,
) -> Result<&'a UploadedFile, Response> {
    let gradebook = form.file("gradebook_file", "zip")?;
    check_archive_bytes(&gradebook.bytes, app_state.limits().max_uncompressed_size)
        .map_err(service_error_response)?;
    Ok(gradebook)
}

async fn save_upload(file: &UploadedFile) -> Result<PathBuf, Response> {
    let path = paths::upload_path(&file.safe_name());
    let write = async {
        paths::ensure_parent_dir(&path)?;
        tokio::fs::write(&path, &file.bytes).await
    };
    write.await.map_err(|e| {
        error!("Failed to save upload {}: {e}", path.display());
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save file")
    })?;
    Ok(path)
}

async fn organize_upload(
    app_state: &AppState,
    assignment_id: i64,
    gradebook: &UploadedFile,
) -> Result<OrganizeSummary, Response> {
    let archive = save_upload(gradebook).await?;
    ingest_gradebook(
        app_state.db(),
        assignment_id,
        &archive,
        app_state.limits().max_uncompressed_size,
    )
    .await
    .map_err(service_error_response)
}

/// POST /api/upload/all
///
/// Creates the assignment (when it does not exist yet) and ingests a
/// gradebook in one go.
///
/// ### Request Body (Multipart Form Data)
/// - `assignment_id`, `assignment_name`, `due_date` (`YYYY-MM-DD`)
/// - `rubric_file` (`.json`), `gradebook_file` (`.zip`)
///
/// ### Responses
/// - `200 OK` with the assignment and organize summary
/// - `400 Bad Request` on a missing field, wrong extension, bad JSON, bad date or corrupt zip
/// - `500 Internal Server Error`
pub async fn upload_all(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let form = UploadForm::read(multipart).await?;
    let fields = assignment_fields(&form)?;
    let gradebook = gradebook_field(&app_state, &form)?;
    let db = app_state.db();

    let existing = AssignmentModel::get_by_id(db, fields.id)
        .await
        .map_err(|e| service_error_response(e.into()))?;
    match existing {
        Some(assignment) => info!(
            "Assignment already exists: {} with ID {}",
            assignment.name, assignment.id
        ),
        None => {
            AssignmentModel::create(db, fields.id, &fields.name, fields.rubric, fields.due_date)
                .await
                .map_err(|e| service_error_response(e.into()))?;
            info!("New assignment created: {} with ID {}", fields.name, fields.id);
        }
    }

    let summary = organize_upload(&app_state, fields.id, gradebook).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            AssignmentUploadResponse {
                assignment_id: fields.id,
                assignment_name: fields.name,
                due_date: fields.due_date,
                organize: Some(summary),
            },
            "Assignment and files uploaded successfully",
        )),
    )
        .into_response())
}

/// POST /api/upload/rubric
///
/// Creates the assignment or replaces its name, rubric and due date.
///
/// ### Request Body (Multipart Form Data)
/// - `assignment_id`, `assignment_name`, `due_date` (`YYYY-MM-DD`), `rubric_file` (`.json`)
pub async fn upload_rubric(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let form = UploadForm::read(multipart).await?;
    let fields = assignment_fields(&form)?;

    let saved = AssignmentModel::upsert(
        app_state.db(),
        fields.id,
        &fields.name,
        fields.rubric,
        fields.due_date,
    )
    .await
    .map_err(|e| service_error_response(e.into()))?;
    info!("Rubric stored for assignment {}", saved.id);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            AssignmentUploadResponse {
                assignment_id: saved.id,
                assignment_name: saved.name,
                due_date: saved.due_date,
                organize: None,
            },
            "Rubric uploaded successfully",
        )),
    )
        .into_response())
}

/// POST /api/upload/gradebook
///
/// ### Request Body (Multipart Form Data)
/// - `assignment_id`, `gradebook_file` (`.zip`)
///
/// ### Responses
/// - `200 OK` with the organize summary
/// - `400 Bad Request` on a wrong extension or corrupt zip (nothing is written in either case)
/// - `404 Not Found` when the assignment does not exist
pub async fn upload_gradebook(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let form = UploadForm::read(multipart).await?;
    let assignment_id = form.id("assignment_id")?;
    let gradebook = gradebook_field(&app_state, &form)?;

    let assignment = AssignmentModel::get_by_id(app_state.db(), assignment_id)
        .await
        .map_err(|e| service_error_response(e.into()))?;
    if assignment.is_none() {
        return Err(error_response(StatusCode::NOT_FOUND, "Assignment not found"));
    }

    let summary = organize_upload(&app_state, assignment_id, gradebook).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            summary,
            "Gradebook file uploaded and organized successfully",
        )),
    )
        .into_response())
}

/// POST /api/upload/group
///
/// ### Request Body (Multipart Form Data)
/// - `group_file` (`.txt`): `Group <n>` headers followed by `<DrexelID> <Name...> <UserID>` lines
///
/// ### Responses
/// - `200 OK` with counts of created groups and students
/// - `400 Bad Request` on a wrong extension or non UTF-8 content
/// - `409 Conflict` when a listed student already exists (nothing is imported)
pub async fn upload_group(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let form = UploadForm::read(multipart).await?;
    let roster = form.file("group_file", "txt")?;
    let text = std::str::from_utf8(&roster.bytes)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Roster must be UTF-8 text"))?;

    let summary: RosterImport = import_roster(app_state.db(), &parse_roster(text))
        .await
        .map_err(service_error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            summary,
            "Roster uploaded and processed successfully",
        )),
    )
        .into_response())
}
