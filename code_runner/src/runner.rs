use crate::ansi::{ansi_to_html, tail_lines};
use crate::file_index::FileIndex;
use crate::highlight::CodeHighlighter;
use crate::report::{AnchorIds, CodeTab, OutputTab, ReportTab, anchor_id};
use crate::rubric::{TestCaseLeaf, TestCaseNode, collect_leaves};
use crate::sandbox;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};
use util::execution_limits::ExecutionLimits;

/// Lines of stdout/stderr kept for display.
pub const MAX_DISPLAY_LINES: usize = 100;

const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs rubric commands against one student's submission tree.
pub struct TestRunner {
    submission_root: PathBuf,
    files: Vec<String>,
    index: FileIndex,
    limits: ExecutionLimits,
    highlighter: Arc<CodeHighlighter>,
}

struct ProcessOutcome {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    timed_out: bool,
}

impl TestRunner {
    /// Indexes `submission_root` once; every lookup afterwards is by base name.
    pub fn new(
        submission_root: &Path,
        files: Vec<String>,
        limits: ExecutionLimits,
        highlighter: Arc<CodeHighlighter>,
    ) -> Self {
        Self {
            index: FileIndex::build(submission_root),
            submission_root: submission_root.to_path_buf(),
            files,
            limits,
            highlighter,
        }
    }

    /// One output tab per leaf in tree order, then one code tab per declared
    /// file. Tab ids are unique within the result.
    pub async fn execute(&self, test_cases: &[(String, TestCaseNode)]) -> Vec<ReportTab> {
        let mut tabs = Vec::new();
        let mut ids = AnchorIds::default();

        for leaf in collect_leaves(test_cases) {
            let mut tab = self.run_case(&leaf).await;
            tab.id = ids.claim(std::mem::take(&mut tab.id));
            tabs.push(ReportTab::Output(tab));
        }
        for file in &self.files {
            let mut tab = self.code_tab(file).await;
            tab.id = ids.claim(std::mem::take(&mut tab.id));
            tabs.push(ReportTab::Code(tab));
        }

        tabs
    }

    async fn run_case(&self, leaf: &TestCaseLeaf) -> OutputTab {
        let mut parts = vec![leaf.script.as_str()];
        parts.extend(leaf.args.iter().map(String::as_str));
        let title = parts.join(" ");

        let mut tab = OutputTab {
            id: anchor_id("tab", &parts),
            command: format!("{} {}", self.limits.interpreter, title),
            title,
            content: String::new(),
            error: None,
            expected: leaf.expected.clone(),
            exit_code: None,
            file_name: leaf.script.clone(),
            function_name: leaf.args.first().cloned(),
            test_case: (leaf.args.len() > 1).then(|| leaf.args[1..].join(" ")),
        };

        let Some(script_path) = self.index.resolve(&leaf.script) else {
            warn!(
                script = %leaf.script,
                args = ?leaf.args,
                "Script not found under {}",
                self.submission_root.display()
            );
            tab.error = Some(format!(
                "Script '{}' was not found in the submission",
                leaf.script
            ));
            return tab;
        };

        debug!(command = %tab.command, "Running test case");
        match self.invoke(script_path, &leaf.args).await {
            Ok(outcome) => {
                tab.content = ansi_to_html(&tail_lines(&outcome.stdout, MAX_DISPLAY_LINES));
                tab.exit_code = outcome.exit_code;
                let stderr = tail_lines(&outcome.stderr, MAX_DISPLAY_LINES);

                tab.error = if outcome.timed_out {
                    Some(format!("Timed out after {} seconds", self.limits.timeout_secs))
                } else if !stderr.is_empty() {
                    Some(stderr)
                } else {
                    match outcome.exit_code {
                        Some(0) => None,
                        Some(code) => Some(format!("Process exited with status {code}")),
                        None => Some("Process was terminated by a signal".to_string()),
                    }
                };

                if tab.error.is_some() {
                    warn!(script = %leaf.script, args = ?leaf.args, "Test case reported an error");
                }
            }
            Err(err) => {
                warn!(script = %leaf.script, args = ?leaf.args, "Failed to start script: {err}");
                tab.error = Some(format!(
                    "Failed to start '{}': {err}",
                    self.limits.interpreter
                ));
            }
        }

        tab
    }

    async fn invoke(&self, script: &Path, args: &[String]) -> io::Result<ProcessOutcome> {
        let mut cmd = Command::new(&self.limits.interpreter);
        cmd.arg(script)
            .args(args)
            .current_dir(&self.submission_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        sandbox::confine(&mut cmd, &self.limits);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        let cap = self.limits.max_output_bytes;
        let stdout = tokio::spawn(read_capped(child.stdout.take(), cap));
        let stderr = tokio::spawn(read_capped(child.stderr.take(), cap));

        let waited = timeout(Duration::from_secs(self.limits.timeout_secs), child.wait()).await;
        sandbox::kill_group(pid);
        let status = match waited {
            Ok(status) => Some(status?),
            Err(_) => {
                if let Err(err) = child.kill().await {
                    warn!("Failed to kill timed out script {}: {err}", script.display());
                }
                None
            }
        };

        Ok(ProcessOutcome {
            stdout: String::from_utf8_lossy(&collect(stdout).await).into_owned(),
            stderr: String::from_utf8_lossy(&collect(stderr).await).into_owned(),
            exit_code: status.and_then(|s| s.code()),
            timed_out: status.is_none(),
        })
    }

    async fn code_tab(&self, file: &str) -> CodeTab {
        let id = anchor_id("code", &[file]);
        let missing = |reason: String| CodeTab {
            id: id.clone(),
            title: file.to_string(),
            content: format!("<p>{}</p>", htmlescape::encode_minimal(&reason)),
            found: false,
        };

        let Some(path) = self.index.resolve(file) else {
            return missing(format!("{file} was not found in the submission."));
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => CodeTab {
                id: id.clone(),
                title: file.to_string(),
                content: self
                    .highlighter
                    .highlight(file, &String::from_utf8_lossy(&bytes)),
                found: true,
            },
            Err(err) => {
                warn!("Could not read {}: {err}", path.display());
                missing(format!("{file} could not be read: {err}"))
            }
        }
    }
}

/// Waits briefly for a pipe reader once its process group is gone; a
/// descendant that escaped the group must not hold the test case open.
async fn collect(task: JoinHandle<io::Result<Vec<u8>>>) -> Vec<u8> {
    let abort = task.abort_handle();
    match timeout(DRAIN_GRACE, task).await {
        Ok(Ok(Ok(buf))) => buf,
        Ok(Ok(Err(err))) => {
            debug!("Reading script output failed: {err}");
            Vec::new()
        }
        Ok(Err(err)) => {
            debug!("Output reader stopped: {err}");
            Vec::new()
        }
        Err(_) => {
            abort.abort();
            Vec::new()
        }
    }
}

/// Reads up to `cap` bytes, then drains the rest so the child never blocks
/// on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> io::Result<Vec<u8>> {
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    (&mut reader).take(cap as u64).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}
