use code_runner::RunnerError;
use db::{DbErr, is_foreign_key_violation, is_unique_violation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(DbErr),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        if is_unique_violation(&err) || is_foreign_key_violation(&err) {
            ServiceError::Conflict(err.to_string())
        } else {
            ServiceError::Db(err)
        }
    }
}

impl From<RunnerError> for ServiceError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::InvalidRubric(msg) => ServiceError::InvalidInput(msg),
            RunnerError::Io(e) => ServiceError::Io(e),
            RunnerError::Db(e) => ServiceError::from(e),
            RunnerError::Render(msg) => ServiceError::Io(std::io::Error::other(msg)),
            RunnerError::AssignmentNotFound(id) => {
                ServiceError::InvalidInput(format!("Assignment {id} not found"))
            }
        }
    }
}

impl From<zip::result::ZipError> for ServiceError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => ServiceError::Io(e),
            other => ServiceError::InvalidArchive(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Io(std::io::Error::from(err))
    }
}
