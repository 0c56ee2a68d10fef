use crate::error::RunnerError;
use askama::Template;
use chrono::NaiveDateTime;
use db::models::{assignment, student, submission};
use serde::Serialize;
use std::collections::HashSet;

/// Result of running one rubric command.
///
/// `content` is HTML (converted from the script's stdout); every other text
/// field is raw and escaped at render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTab {
    pub id: String,
    pub title: String,
    pub content: String,
    pub error: Option<String>,
    pub expected: String,
    pub command: String,
    pub exit_code: Option<i32>,
    pub file_name: String,
    pub function_name: Option<String>,
    pub test_case: Option<String>,
}

/// Highlighted listing of one declared source file. `content` is HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeTab {
    pub id: String,
    pub title: String,
    pub content: String,
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportTab {
    Output(OutputTab),
    Code(CodeTab),
}

impl ReportTab {
    pub fn id(&self) -> &str {
        match self {
            ReportTab::Output(tab) => &tab.id,
            ReportTab::Code(tab) => &tab.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ReportTab::Output(tab) => &tab.title,
            ReportTab::Code(tab) => &tab.title,
        }
    }

    pub fn as_output(&self) -> Option<&OutputTab> {
        match self {
            ReportTab::Output(tab) => Some(tab),
            ReportTab::Code(_) => None,
        }
    }
}

/// Builds an HTML anchor id: anything other than ASCII alphanumerics, `-`
/// and `_` becomes `_`.
pub fn anchor_id(prefix: &str, parts: &[&str]) -> String {
    let raw = format!("{prefix}_{}", parts.join("_"));
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Hands out anchor ids that are unique within one report. A repeated id
/// gets `_2`, `_3`, ... appended.
#[derive(Debug, Default)]
pub struct AnchorIds {
    used: HashSet<String>,
}

impl AnchorIds {
    pub fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.used.insert(candidate.clone()))
            .unwrap_or(base)
    }
}

/// Header information shown above the tabs. Grades are left out: they change
/// without touching the submission, so a cached report would go stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportMeta {
    pub assignment_id: i64,
    pub assignment_name: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub submission_date: Option<NaiveDateTime>,
}

impl ReportMeta {
    pub fn from_models(
        assignment: &assignment::Model,
        student: Option<&student::Model>,
        submission: &submission::Model,
    ) -> Self {
        Self {
            assignment_id: assignment.id,
            assignment_name: assignment.name.clone(),
            student_id: submission.student_id.clone(),
            student_name: student.map(|s| s.name.clone()),
            submission_date: Some(submission.submission_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContext {
    pub meta: ReportMeta,
    pub tabs: Vec<ReportTab>,
}

/// Turns a finished run into a document.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, ctx: &ReportContext) -> Result<String, RunnerError>;
}

/// Renders `templates/report.html`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReportRenderer;

struct TabView<'a> {
    id: &'a str,
    title: &'a str,
    is_output: bool,
    content: &'a str,
    error: Option<&'a str>,
    expected: &'a str,
    command: &'a str,
    exit_code: String,
    breadcrumbs: String,
}

impl<'a> From<&'a ReportTab> for TabView<'a> {
    fn from(tab: &'a ReportTab) -> Self {
        match tab {
            ReportTab::Output(t) => {
                let mut crumbs = vec![t.file_name.as_str()];
                crumbs.extend(t.function_name.as_deref());
                crumbs.extend(t.test_case.as_deref());
                TabView {
                    id: &t.id,
                    title: &t.title,
                    is_output: true,
                    content: &t.content,
                    error: t.error.as_deref(),
                    expected: &t.expected,
                    command: &t.command,
                    exit_code: t
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    breadcrumbs: crumbs.join(" / "),
                }
            }
            ReportTab::Code(t) => TabView {
                id: &t.id,
                title: &t.title,
                is_output: false,
                content: &t.content,
                error: None,
                expected: "",
                command: "",
                exit_code: String::new(),
                breadcrumbs: String::new(),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    assignment_name: &'a str,
    assignment_id: i64,
    student_id: &'a str,
    student_name: &'a str,
    submission_date: String,
    tabs: Vec<TabView<'a>>,
}

impl ReportRenderer for HtmlReportRenderer {
    fn render(&self, ctx: &ReportContext) -> Result<String, RunnerError> {
        let meta = &ctx.meta;
        let page = ReportPage {
            assignment_name: &meta.assignment_name,
            assignment_id: meta.assignment_id,
            student_id: &meta.student_id,
            student_name: meta.student_name.as_deref().unwrap_or(&meta.student_id),
            submission_date: meta
                .submission_date
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            tabs: ctx.tabs.iter().map(TabView::from).collect(),
        };
        Ok(page.render()?)
    }
}
