//! Fans a flat, freshly extracted gradebook out into per-student folders.
//!
//! Routing is purely filename driven: the student id is whatever matches
//! `_<2-5 letters><2-6 digits>_` in the file name, and it is only checked
//! against the roster when a submission row is recorded.

use crate::archive::unzip_recursive;
use crate::error::ServiceError;
use crate::submission_log::read_submission_date;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use util::paths::{self, ARCHIVE_DIR_NAME};

static STUDENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([a-zA-Z]{2,5}\d{2,6})_").unwrap());

pub fn student_id_from_filename(file_name: &str) -> Option<&str> {
    STUDENT_ID
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// Student or assignment unknown; nothing written.
    Skipped,
    /// A submission for this student and assignment already exists.
    Conflict,
}

/// Persists a submission once its log yielded a timestamp.
#[async_trait]
pub trait SubmissionRecorder: Send + Sync {
    async fn record(
        &self,
        student_id: &str,
        submitted_at: NaiveDateTime,
        student_dir: &Path,
    ) -> Result<RecordOutcome, ServiceError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizeSummary {
    /// Top-level files moved into a student folder.
    pub routed: usize,
    /// Top-level files whose name carries no student id.
    pub skipped: usize,
    pub recorded: usize,
    pub conflicts: usize,
    /// Logs without a usable date, plus unknown students or assignments.
    pub unrecorded: usize,
    pub archives_expanded: usize,
}

pub struct Organizer {
    staging: PathBuf,
    max_uncompressed_size: u64,
}

impl Organizer {
    pub fn new(staging: impl Into<PathBuf>, max_uncompressed_size: u64) -> Self {
        Self {
            staging: staging.into(),
            max_uncompressed_size,
        }
    }

    /// Routes every top-level file, then expands nested archives in each
    /// student folder except `archive/`.
    ///
    /// Unmatched names, undated logs and failed recordings are logged and
    /// counted; only filesystem errors on the staging directory abort. The
    /// filesystem passes run on the blocking pool.
    pub async fn organize(
        &self,
        recorder: &dyn SubmissionRecorder,
    ) -> Result<OrganizeSummary, ServiceError> {
        let staging = self.staging.clone();
        let routed = tokio::task::spawn_blocking(move || route_all(&staging)).await??;

        let mut summary = OrganizeSummary {
            routed: routed.routed,
            skipped: routed.skipped,
            ..Default::default()
        };
        for log in &routed.logs {
            record_from_log(log, recorder, &mut summary).await;
        }

        let staging = self.staging.clone();
        let max = self.max_uncompressed_size;
        summary.archives_expanded =
            tokio::task::spawn_blocking(move || expand_student_archives(&staging, max)).await??;

        info!(
            staging = %self.staging.display(),
            routed = summary.routed,
            skipped = summary.skipped,
            recorded = summary.recorded,
            conflicts = summary.conflicts,
            "Organized gradebook"
        );
        Ok(summary)
    }
}

/// A `submission.log` moved into place, waiting to be recorded.
struct RoutedLog {
    student_id: String,
    log: PathBuf,
    student_dir: PathBuf,
}

#[derive(Default)]
struct RoutedFiles {
    routed: usize,
    skipped: usize,
    logs: Vec<RoutedLog>,
}

fn route_all(staging: &Path) -> Result<RoutedFiles, ServiceError> {
    let mut files: Vec<PathBuf> = fs::read_dir(staging)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut out = RoutedFiles::default();
    for file in files {
        route(staging, &file, &mut out)?;
    }
    Ok(out)
}

fn route(staging: &Path, file: &Path, out: &mut RoutedFiles) -> Result<(), ServiceError> {
    let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
        out.skipped += 1;
        return Ok(());
    };
    let Some(student_id) = student_id_from_filename(file_name) else {
        warn!("No student id in '{file_name}', leaving it in place");
        out.skipped += 1;
        return Ok(());
    };

    let student_dir = paths::student_dir(staging, student_id);
    let log = paths::submission_log_path(&student_dir);
    let target = match file.extension().and_then(|e| e.to_str()) {
        Some("zip") => paths::submission_root(&student_dir).join(file_name),
        Some("txt") => log.clone(),
        _ => student_dir.join(file_name),
    };
    paths::ensure_parent_dir(&target)?;
    fs::rename(file, &target)?;
    out.routed += 1;

    if target == log {
        out.logs.push(RoutedLog {
            student_id: student_id.to_string(),
            log,
            student_dir,
        });
    }
    Ok(())
}

fn expand_student_archives(staging: &Path, max_uncompressed_size: u64) -> Result<usize, ServiceError> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(staging)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| p.file_name().is_some_and(|n| n != ARCHIVE_DIR_NAME))
        .collect();
    dirs.sort();

    Ok(dirs
        .iter()
        .map(|dir| unzip_recursive(dir, max_uncompressed_size))
        .sum())
}

async fn record_from_log(
    routed: &RoutedLog,
    recorder: &dyn SubmissionRecorder,
    summary: &mut OrganizeSummary,
) {
    let student_id = routed.student_id.as_str();
    let Some(submitted_at) = read_submission_date(&routed.log).await else {
        warn!("No submission date in {}, not recording", routed.log.display());
        summary.unrecorded += 1;
        return;
    };

    match recorder.record(student_id, submitted_at, &routed.student_dir).await {
        Ok(RecordOutcome::Recorded) => summary.recorded += 1,
        Ok(RecordOutcome::Skipped) => summary.unrecorded += 1,
        Ok(RecordOutcome::Conflict) => summary.conflicts += 1,
        Err(err) => {
            warn!("Recording submission for {student_id} failed: {err}");
            summary.unrecorded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::write_zip;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const LIMIT: u64 = 10 * 1024 * 1024;
    const LOG: &str = "Date Submitted: Monday, January 06, 2025 11:59:59 PM EST\n";

    #[derive(Default)]
    struct MemoryRecorder {
        calls: Mutex<Vec<(String, NaiveDateTime, PathBuf)>>,
    }

    #[async_trait]
    impl SubmissionRecorder for MemoryRecorder {
        async fn record(
            &self,
            student_id: &str,
            submitted_at: NaiveDateTime,
            student_dir: &Path,
        ) -> Result<RecordOutcome, ServiceError> {
            self.calls.lock().unwrap().push((
                student_id.to_string(),
                submitted_at,
                student_dir.to_path_buf(),
            ));
            Ok(RecordOutcome::Recorded)
        }
    }

    #[test]
    fn extracts_student_ids() {
        assert_eq!(
            student_id_from_filename("Search_abc123_attempt_2025-01-06.zip"),
            Some("abc123")
        );
        assert_eq!(student_id_from_filename("HW_xyzq98765_x.txt"), Some("xyzq98765"));
        assert_eq!(student_id_from_filename("notes.txt"), None);
        assert_eq!(student_id_from_filename("a_1234_b.zip"), None);
        assert_eq!(student_id_from_filename("a_abcdef12_b.zip"), None);
    }

    #[tokio::test]
    async fn routes_files_and_records_dated_logs() {
        let dir = tempdir().unwrap();
        let staging = dir.path();
        write_zip(
            &staging.join("HW1_abc123_attempt_2025.zip"),
            &[("search.py", b"print(1)")],
        );
        fs::write(staging.join("HW1_abc123_attempt_2025.txt"), LOG).unwrap();
        fs::write(staging.join("HW1_xyz987_attempt_2025.txt"), "no date").unwrap();
        fs::write(staging.join("README.md"), "instructions").unwrap();

        let recorder = MemoryRecorder::default();
        let summary = Organizer::new(staging, LIMIT)
            .organize(&recorder)
            .await
            .unwrap();

        assert_eq!(summary.routed, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.unrecorded, 1);
        assert_eq!(summary.archives_expanded, 1);

        let abc = staging.join("abc123");
        assert!(abc.join("submission.log").is_file());
        assert!(abc.join("submission/search.py").is_file());
        assert!(!abc.join("submission/HW1_abc123_attempt_2025.zip").exists());
        assert!(staging.join("xyz987/submission.log").is_file());
        assert!(staging.join("README.md").is_file());

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "abc123");
        assert_eq!(
            calls[0].1,
            NaiveDate::from_ymd_opt(2025, 1, 6)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap()
        );
        assert_eq!(calls[0].2, abc);
    }

    #[tokio::test]
    async fn archive_folder_is_not_expanded() {
        let dir = tempdir().unwrap();
        let staging = dir.path();
        fs::create_dir_all(staging.join("archive")).unwrap();
        write_zip(&staging.join("archive/old.zip"), &[("x.txt", b"x")]);

        let summary = Organizer::new(staging, LIMIT)
            .organize(&MemoryRecorder::default())
            .await
            .unwrap();

        assert_eq!(summary.archives_expanded, 0);
        assert!(staging.join("archive/old.zip").is_file());
    }

    #[tokio::test]
    async fn other_extensions_land_in_the_student_folder() {
        let dir = tempdir().unwrap();
        let staging = dir.path();
        fs::write(staging.join("HW1_abc123_notes.pdf"), "pdf").unwrap();

        let summary = Organizer::new(staging, LIMIT)
            .organize(&MemoryRecorder::default())
            .await
            .unwrap();

        assert_eq!(summary.routed, 1);
        assert!(staging.join("abc123/HW1_abc123_notes.pdf").is_file());
    }

    #[tokio::test]
    async fn nested_archives_in_every_student_folder_are_expanded() {
        let dir = tempdir().unwrap();
        let staging = dir.path();
        for id in ["abc123", "xyz987"] {
            let inner = crate::archive::test_support::zip_bytes(&[("deep/search.py", b"pass")]);
            write_zip(
                &staging.join(format!("HW1_{id}_attempt.zip")),
                &[("inner.zip", &inner)],
            );
        }

        let summary = Organizer::new(staging, LIMIT)
            .organize(&MemoryRecorder::default())
            .await
            .unwrap();

        assert_eq!(summary.routed, 2);
        assert_eq!(summary.archives_expanded, 4);
        for id in ["abc123", "xyz987"] {
            assert!(staging.join(id).join("submission/deep/search.py").is_file());
        }
    }

    #[tokio::test]
    async fn missing_staging_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = Organizer::new(dir.path().join("gone"), LIMIT)
            .organize(&MemoryRecorder::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
