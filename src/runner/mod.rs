//! Suite executor: runs every case of a suite, in order, and records a
//! result for each one.
//!
//! A case that fails, errors or times out is recorded and the run moves on;
//! nothing a single case does aborts the suite.

use std::time::{Duration, Instant};

use tracing::{info, info_span, warn};

use crate::{
    config::RunConfig,
    report::{CaseResult, LoadFailure, Outcome, RunReport, SuiteReport},
    suite::{Case, LoadedSuites, Suite},
};

pub mod matcher;
pub mod process;

pub use matcher::compare;
pub use process::{execute, Execution};

/// Runs suites sequentially according to a [`RunConfig`].
#[derive(Debug, Clone, Default)]
pub struct Executor {
    filter: Option<String>,
    default_timeout: Option<Duration>,
}

impl Executor {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            filter: config.normalized_filter(),
            default_timeout: config.default_timeout,
        }
    }

    /// Runs every loaded suite; load failures are carried into the report.
    pub fn run_all(&self, loaded: &LoadedSuites) -> RunReport {
        let started = Instant::now();
        let suites = loaded.suites.iter().map(|s| self.run_suite(s)).collect();
        let load_failures = loaded
            .failures
            .iter()
            .map(|(path, err)| LoadFailure {
                path: path.clone(),
                message: err.to_string(),
            })
            .collect();
        RunReport {
            suites,
            load_failures,
            duration: started.elapsed(),
        }
    }

    /// Runs the cases of `suite` in order, producing exactly one result per case.
    pub fn run_suite(&self, suite: &Suite) -> SuiteReport {
        let span = info_span!("suite", name = %suite.name);
        let _guard = span.enter();
        info!(cases = suite.cases.len(), path = %suite.path.display(), "running suite");

        let started = Instant::now();
        let has_only = suite.has_only();
        let results: Vec<CaseResult> = suite
            .cases
            .iter()
            .map(|case| match skip_reason(case, has_only, self.filter.as_deref()) {
                Some(reason) => CaseResult::skipped(case.name.clone(), reason),
                None => self.run_case(case),
            })
            .collect();

        let report = SuiteReport {
            name: suite.name.clone(),
            path: suite.path.clone(),
            results,
            duration: started.elapsed(),
        };
        let summary = report.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            skipped = summary.skipped,
            "suite finished"
        );
        report
    }

    /// Executes one case and compares its output, ignoring skip markers.
    pub fn run_case(&self, case: &Case) -> CaseResult {
        let timeout = case.timeout.or(self.default_timeout);
        let started = Instant::now();
        let execution = execute(&case.input, timeout);
        let duration = started.elapsed();

        let (outcome, actual) = match execution {
            Ok(Execution::Completed(actual)) => {
                let mismatches = compare(&case.expected, &actual);
                let outcome = if mismatches.is_empty() {
                    Outcome::Pass
                } else {
                    Outcome::Fail { mismatches }
                };
                (outcome, Some(actual))
            }
            Ok(Execution::TimedOut { limit, partial }) => {
                warn!(case = %case.name, limit_ms = limit.as_millis() as u64, "case timed out");
                let message = format!("timed out after {}ms", limit.as_millis());
                (Outcome::Error { message }, Some(partial))
            }
            Err(e) => {
                warn!(case = %case.name, error = %e, "case could not run");
                (
                    Outcome::Error {
                        message: e.to_string(),
                    },
                    None,
                )
            }
        };

        CaseResult {
            name: case.name.clone(),
            outcome,
            actual,
            duration,
        }
    }
}

/// Why a case should not run, if it should not.
///
/// `filter` must already be lowercase.
pub fn skip_reason(case: &Case, has_only: bool, filter: Option<&str>) -> Option<String> {
    if has_only && !case.only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(f) {
            return Some(format!("Filtered out by substring: {}", f));
        }
    }
    None
}
