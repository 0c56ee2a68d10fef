use db::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render report: {0}")]
    Render(String),

    #[error("Invalid rubric: {0}")]
    InvalidRubric(String),

    #[error("Assignment {0} not found")]
    AssignmentNotFound(i64),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl From<askama::Error> for RunnerError {
    fn from(err: askama::Error) -> Self {
        RunnerError::Render(err.to_string())
    }
}
