use crate::error::RunnerError;
use crate::highlight::CodeHighlighter;
use crate::report::{HtmlReportRenderer, ReportContext, ReportMeta, ReportRenderer};
use crate::rubric::Rubric;
use crate::runner::TestRunner;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};
use util::execution_limits::ExecutionLimits;
use util::paths;
use walkdir::WalkDir;

/// Everything needed to produce one student's report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// The organized student directory (`<staging>/<student-id>`).
    pub student_dir: PathBuf,
    pub rubric: Rubric,
    pub meta: ReportMeta,
}

#[derive(Debug, Clone)]
pub struct CachedReport {
    pub html: String,
    pub regenerated: bool,
}

/// On-disk report cache keyed by student directory.
///
/// Built once per process and shared; the `result.html` files themselves are
/// the only state.
pub struct ReportCache {
    renderer: Arc<dyn ReportRenderer>,
    highlighter: Arc<CodeHighlighter>,
    limits: ExecutionLimits,
}

impl ReportCache {
    pub fn new(
        renderer: Arc<dyn ReportRenderer>,
        highlighter: Arc<CodeHighlighter>,
        limits: ExecutionLimits,
    ) -> Self {
        Self {
            renderer,
            highlighter,
            limits,
        }
    }

    /// HTML renderer, a fresh highlighter and limits from the global config.
    pub fn from_config() -> Self {
        Self::new(
            Arc::new(HtmlReportRenderer),
            Arc::new(CodeHighlighter::new()),
            ExecutionLimits::from_config(),
        )
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Returns the stored report when it is at least as new as everything in
    /// the student directory, otherwise runs the rubric and overwrites it.
    pub async fn get_or_render(
        &self,
        request: &ReportRequest,
        force: bool,
    ) -> Result<CachedReport, RunnerError> {
        let report_path = paths::report_path(&request.student_dir);

        if !force && fresh_off_thread(&request.student_dir, &report_path).await? {
            debug!("Serving cached report {}", report_path.display());
            let html = tokio::fs::read_to_string(&report_path).await?;
            return Ok(CachedReport {
                html,
                regenerated: false,
            });
        }

        let html = self.render(request).await?;
        if let Some(parent) = report_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&report_path, &html).await?;
        info!(
            student = %request.meta.student_id,
            assignment = request.meta.assignment_id,
            "Report written to {}",
            report_path.display()
        );

        Ok(CachedReport {
            html,
            regenerated: true,
        })
    }

    /// Runs the rubric and renders the result without touching the cache.
    pub async fn render(&self, request: &ReportRequest) -> Result<String, RunnerError> {
        let runner = TestRunner::new(
            &paths::submission_root(&request.student_dir),
            request.rubric.files.clone(),
            self.limits.clone(),
            Arc::clone(&self.highlighter),
        );
        let tabs = runner.execute(&request.rubric.test_cases).await;

        self.renderer.render(&ReportContext {
            meta: request.meta.clone(),
            tabs,
        })
    }
}

/// [`is_fresh`] on the blocking pool; the walk stats every file the student
/// submitted.
async fn fresh_off_thread(student_dir: &Path, report: &Path) -> Result<bool, RunnerError> {
    let student_dir = student_dir.to_path_buf();
    let report = report.to_path_buf();
    let fresh = tokio::task::spawn_blocking(move || is_fresh(&student_dir, &report))
        .await
        .map_err(io::Error::from)??;
    Ok(fresh)
}

/// True when `report` exists and is not older than any entry below
/// `student_dir` (the report itself excluded).
pub fn is_fresh(student_dir: &Path, report: &Path) -> io::Result<bool> {
    let report_mtime = match std::fs::metadata(report) {
        Ok(meta) => meta.modified()?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    Ok(match newest_mtime(student_dir, report) {
        Some(newest) => report_mtime >= newest,
        None => true,
    })
}

fn newest_mtime(dir: &Path, exclude: &Path) -> Option<SystemTime> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path() != exclude)
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max()
}
