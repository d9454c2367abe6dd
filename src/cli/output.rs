//! User-facing text the CLI prints outside the report itself.

use miette::Report;

use crate::{report::RunReport, SeaQaError};

/// Printed when `--spec` is missing.
pub const USAGE: &str = "SEA-SEQ: Please provide a spec file with --spec <suite.yaml>";

/// Prints a SeaQaError with full miette diagnostics on stderr.
pub fn print_error(error: SeaQaError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

/// The line printed once every suite has run.
pub fn completion_line(run: &RunReport) -> String {
    format!(
        "SEA-SEQ finished running {} case(s) from {} suite(s)",
        run.case_count(),
        run.suites.len()
    )
}
