//! Result model and report emitters.
//!
//! The executor produces one [`CaseResult`] per case, grouped into
//! [`SuiteReport`]s and finally a [`RunReport`]. Emitters render a run:
//! [`console`] for humans, [`json`] and [`junit`] for machines.

use std::{
    fmt, fs,
    ops::AddAssign,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Serialize, Serializer};

pub mod console;
pub mod csv;
pub mod html;
pub mod json;
pub mod junit;

pub use console::ConsoleReporter;

/// Exit code when every executed case passed.
pub const SUCCESS_CODE: i32 = 0;
/// Exit code when anything failed, errored or could not be loaded.
pub const FAILURE_CODE: i32 = 1;

// ============================================================================
// PER-CASE RESULTS
// ============================================================================

/// Coarse status of a case result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Error,
    Skipped,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
            Status::Skipped => "SKIP",
        }
    }

    /// Lowercase name, as used in machine-readable reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Error => "error",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which output stream a mismatch refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// One way the actual outcome of a case differs from its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    ExitCode {
        expected: i32,
        /// `None` when the process was terminated by a signal.
        actual: Option<i32>,
    },
    Output {
        stream: Stream,
        expected: String,
        actual: String,
    },
    MissingText {
        stream: Stream,
        needle: String,
    },
    PatternNotMatched {
        stream: Stream,
        pattern: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::ExitCode {
                expected,
                actual: Some(actual),
            } => write!(f, "expected exit code {expected}, got {actual}"),
            Mismatch::ExitCode {
                expected,
                actual: None,
            } => write!(f, "expected exit code {expected}, process was terminated by a signal"),
            Mismatch::Output { stream, .. } => write!(f, "{stream} did not match expected"),
            Mismatch::MissingText { stream, needle } => {
                write!(f, "{stream} does not contain {needle:?}")
            }
            Mismatch::PatternNotMatched { stream, pattern } => {
                write!(f, "{stream} does not match /{pattern}/")
            }
        }
    }
}

/// Detailed outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail { mismatches: Vec<Mismatch> },
    Error { message: String },
    Skipped { reason: String },
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Pass => Status::Pass,
            Outcome::Fail { .. } => Status::Fail,
            Outcome::Error { .. } => Status::Error,
            Outcome::Skipped { .. } => Status::Skipped,
        }
    }
}

/// What a case actually produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

/// The outcome of executing one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub outcome: Outcome,
    /// Absent for skipped cases and cases that never started.
    pub actual: Option<CapturedOutput>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CaseResult {
    pub fn status(&self) -> Status {
        self.outcome.status()
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
            actual: None,
            duration: Duration::ZERO,
        }
    }

    /// One-line explanation of a non-passing outcome; empty for a pass.
    pub fn detail(&self) -> String {
        match &self.outcome {
            Outcome::Pass => String::new(),
            Outcome::Fail { mismatches } => mismatches
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            Outcome::Error { message } => message.clone(),
            Outcome::Skipped { reason } => reason.clone(),
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Counts of results by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a CaseResult>) -> Self {
        let mut summary = Summary::default();
        for result in results {
            summary.record(result.status());
        }
        summary
    }

    pub fn record(&mut self, status: Status) {
        match status {
            Status::Pass => self.passed += 1,
            Status::Fail => self.failed += 1,
            Status::Error => self.errored += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    /// Skipped cases are neutral.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, rhs: Self) {
        self.passed += rhs.passed;
        self.failed += rhs.failed;
        self.errored += rhs.errored;
        self.skipped += rhs.skipped;
    }
}

/// Ordered results of one suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub path: PathBuf,
    pub results: Vec<CaseResult>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl SuiteReport {
    pub fn summary(&self) -> Summary {
        Summary::from_results(&self.results)
    }
}

/// A suite file that could not be loaded in a directory run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Everything one invocation of the runner produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
    pub load_failures: Vec<LoadFailure>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for suite in &self.suites {
            summary += suite.summary();
        }
        summary
    }

    /// `0` when every executed case passed and every suite loaded, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.summary().all_passed() && self.load_failures.is_empty() {
            SUCCESS_CODE
        } else {
            FAILURE_CODE
        }
    }

    pub fn case_count(&self) -> usize {
        self.suites.iter().map(|s| s.results.len()).sum()
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Writes a rendered report to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), crate::SeaQaError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| crate::SeaQaError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| crate::SeaQaError::io(path, e))
}

/// Formats a duration for humans: `412ms`, `3.20s`.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
