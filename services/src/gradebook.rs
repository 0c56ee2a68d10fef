use crate::archive::extract_archive;
use crate::error::ServiceError;
use crate::organizer::{OrganizeSummary, Organizer};
use crate::submission_recorder::DbSubmissionRecorder;
use sea_orm::DatabaseConnection;
use std::path::{Path, PathBuf};
use tracing::info;
use util::paths;

/// Extracts an uploaded gradebook into the assignment's staging directory and
/// organizes it, recording dated submissions in the database.
pub async fn ingest_gradebook(
    db: &DatabaseConnection,
    assignment_id: i64,
    archive: &Path,
    max_uncompressed_size: u64,
) -> Result<OrganizeSummary, ServiceError> {
    let staging = paths::unzip_dir(assignment_id);
    extract_blocking(archive.to_path_buf(), staging.clone(), max_uncompressed_size).await?;
    info!(
        assignment = assignment_id,
        "Gradebook {} extracted to {}",
        archive.display(),
        staging.display()
    );

    let recorder = DbSubmissionRecorder::new(db.clone(), assignment_id);
    Organizer::new(staging, max_uncompressed_size)
        .organize(&recorder)
        .await
}

async fn extract_blocking(
    archive: PathBuf,
    destination: PathBuf,
    max_uncompressed_size: u64,
) -> Result<usize, ServiceError> {
    tokio::task::spawn_blocking(move || {
        extract_archive(&archive, &destination, max_uncompressed_size)
    })
    .await?
}
