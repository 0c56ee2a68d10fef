use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Directory name holding a student's actual files inside their folder.
pub const SUBMISSION_DIR_NAME: &str = "submission";
/// Fixed name given to a student's submission log when it is organized.
pub const SUBMISSION_LOG_NAME: &str = "submission.log";
/// Rendered report written next to the `submission/` folder.
pub const REPORT_FILE_NAME: &str = "result.html";
/// Staging subfolder that the organizer never unzips.
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Raw uploads land here: {STORAGE_ROOT}/uploads
pub fn uploads_dir() -> PathBuf {
    storage_root().join("uploads")
}

/// Build a path under the uploads directory (does not create).
pub fn upload_path(filename: &str) -> PathBuf {
    uploads_dir().join(filename)
}

/// Staging root for all extracted gradebooks: {STORAGE_ROOT}/unzip
pub fn unzip_root() -> PathBuf {
    storage_root().join("unzip")
}

/// Per-assignment staging directory: {STORAGE_ROOT}/unzip/assignment_{id}
pub fn unzip_dir(assignment_id: i64) -> PathBuf {
    unzip_root().join(format!("assignment_{assignment_id}"))
}

// ─── Helpers relative to an organized student directory ─────────────

/// `<staging>/<student-id>`
pub fn student_dir(staging: &Path, student_id: &str) -> PathBuf {
    staging.join(student_id)
}

/// `<student-dir>/submission`
pub fn submission_root(student_dir: &Path) -> PathBuf {
    student_dir.join(SUBMISSION_DIR_NAME)
}

/// `<student-dir>/result.html`
pub fn report_path(student_dir: &Path) -> PathBuf {
    student_dir.join(REPORT_FILE_NAME)
}

/// `<student-dir>/submission.log`
pub fn submission_log_path(student_dir: &Path) -> PathBuf {
    student_dir.join(SUBMISSION_LOG_NAME)
}
