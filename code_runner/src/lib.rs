//! Runs rubric scripts against organized submissions and renders the results.
//!
//! The pieces, leaf first: [`rubric`] types the uploaded test-case tree,
//! [`runner::TestRunner`] executes it against one submission tree,
//! [`report`] renders the resulting tabs, [`cache::ReportCache`] keeps the
//! rendered `result.html` until the submission changes, and
//! [`batch::BatchOrchestrator`] regenerates a whole assignment in the
//! background.

pub mod ansi;
pub mod batch;
pub mod cache;
pub mod error;
pub mod file_index;
pub mod highlight;
pub mod report;
pub mod rubric;
pub mod runner;
pub mod sandbox;

pub use batch::{BatchOrchestrator, BatchSummary};
pub use cache::{CachedReport, ReportCache, ReportRequest};
pub use error::RunnerError;
pub use highlight::CodeHighlighter;
pub use report::{HtmlReportRenderer, ReportContext, ReportMeta, ReportRenderer, ReportTab};
pub use rubric::{Rubric, TestCaseNode};
pub use runner::TestRunner;
