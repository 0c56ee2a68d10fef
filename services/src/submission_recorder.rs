use crate::error::ServiceError;
use crate::organizer::{RecordOutcome, SubmissionRecorder};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use code_runner::Rubric;
use db::is_unique_violation;
use db::models::{assignment, student, submission};
use sea_orm::DatabaseConnection;
use std::path::Path;
use tracing::{info, warn};

/// Writes organized submissions for one assignment to the database.
pub struct DbSubmissionRecorder {
    db: DatabaseConnection,
    assignment_id: i64,
}

impl DbSubmissionRecorder {
    pub fn new(db: DatabaseConnection, assignment_id: i64) -> Self {
        Self { db, assignment_id }
    }
}

#[async_trait]
impl SubmissionRecorder for DbSubmissionRecorder {
    async fn record(
        &self,
        student_id: &str,
        submitted_at: NaiveDateTime,
        student_dir: &Path,
    ) -> Result<RecordOutcome, ServiceError> {
        let Some(student) = student::Model::get_by_user_id(&self.db, student_id).await? else {
            warn!("Student {student_id} not found, submission not recorded");
            return Ok(RecordOutcome::Skipped);
        };
        let Some(assignment) = assignment::Model::get_by_id(&self.db, self.assignment_id).await?
        else {
            warn!("Assignment {} not found, submission not recorded", self.assignment_id);
            return Ok(RecordOutcome::Skipped);
        };

        let skeleton = Rubric::try_from(&assignment.rubric)?.feedback_skeleton();

        match submission::Model::create(
            &self.db,
            &student.user_id,
            assignment.id,
            submitted_at,
            skeleton,
            &student_dir.to_string_lossy(),
        )
        .await
        {
            Ok(created) => {
                info!(
                    submission = created.id,
                    "Recorded submission for {} ({})", student.name, student.user_id
                );
                Ok(RecordOutcome::Recorded)
            }
            Err(err) if is_unique_violation(&err) => {
                warn!(
                    "Submission for {student_id} on assignment {} already exists",
                    self.assignment_id
                );
                Ok(RecordOutcome::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }
}
