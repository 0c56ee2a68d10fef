use crate::cache::{ReportCache, ReportRequest};
use crate::error::RunnerError;
use crate::report::ReportMeta;
use crate::rubric::Rubric;
use db::models::{assignment, student, submission};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub scheduled: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Regenerates every report of an assignment on a bounded pool.
///
/// Student scripts always run as child processes, and each job is its own
/// task, so one crashing submission never takes a sibling down with it.
pub struct BatchOrchestrator {
    cache: Arc<ReportCache>,
    workers: usize,
}

impl BatchOrchestrator {
    pub fn new(cache: Arc<ReportCache>, workers: usize) -> Self {
        Self {
            cache,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Loads the assignment's submissions and starts the batch in the
    /// background.
    ///
    /// Submissions whose directory or student row is missing are skipped
    /// here. The returned handle resolves once every scheduled job finished;
    /// callers that do not care may drop it.
    pub async fn dispatch(
        &self,
        db: &DatabaseConnection,
        assignment_id: i64,
    ) -> Result<JoinHandle<BatchSummary>, RunnerError> {
        let assignment = assignment::Model::get_by_id(db, assignment_id)
            .await?
            .ok_or(RunnerError::AssignmentNotFound(assignment_id))?;
        let rubric = Rubric::try_from(&assignment.rubric)?;
        let submissions = submission::Model::list_for_assignment(db, assignment_id).await?;

        let mut summary = BatchSummary::default();
        let mut jobs = Vec::new();

        for sub in &submissions {
            let student_dir = PathBuf::from(&sub.file_path);
            if !student_dir.is_dir() {
                warn!(
                    submission = sub.id,
                    "Skipping {}: directory {} is missing",
                    sub.student_id,
                    student_dir.display()
                );
                summary.skipped += 1;
                continue;
            }

            let Some(student) = student::Model::get_by_user_id(db, &sub.student_id).await? else {
                warn!(submission = sub.id, "Skipping {}: student not found", sub.student_id);
                summary.skipped += 1;
                continue;
            };

            jobs.push(ReportRequest {
                student_dir,
                rubric: rubric.clone(),
                meta: ReportMeta::from_models(&assignment, Some(&student), sub),
            });
        }

        summary.scheduled = jobs.len();
        info!(
            assignment = assignment_id,
            scheduled = summary.scheduled,
            skipped = summary.skipped,
            workers = self.workers,
            "Dispatching report batch"
        );

        let cache = Arc::clone(&self.cache);
        let permits = Arc::new(Semaphore::new(self.workers));

        Ok(tokio::spawn(async move {
            let mut set = JoinSet::new();

            for job in jobs {
                let cache = Arc::clone(&cache);
                let permits = Arc::clone(&permits);
                set.spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| RunnerError::Io(std::io::Error::other(e)))?;
                    // Rubric edits do not touch the tree, so the batch always re-renders.
                    cache.get_or_render(&job, true).await?;
                    Ok::<_, RunnerError>(job.meta.student_id)
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(Ok(student_id)) => {
                        summary.succeeded += 1;
                        info!(assignment = assignment_id, "Report ready for {student_id}");
                    }
                    Ok(Err(err)) => {
                        summary.failed += 1;
                        warn!(assignment = assignment_id, "Report job failed: {err}");
                    }
                    Err(err) => {
                        summary.failed += 1;
                        error!(assignment = assignment_id, "Report job panicked: {err}");
                    }
                }
            }

            info!(
                assignment = assignment_id,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Report batch finished"
            );
            summary
        }))
    }
}
