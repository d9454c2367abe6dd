//! Machine-readable JSON report.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::{RunReport, Summary};
use crate::{err_msg, SeaQaError};

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: String,
    exit_code: i32,
    summary: Summary,
    #[serde(flatten)]
    run: &'a RunReport,
}

/// Renders the run as pretty-printed JSON.
pub fn render(run: &RunReport) -> Result<String, SeaQaError> {
    let report = JsonReport {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        exit_code: run.exit_code(),
        summary: run.summary(),
        run,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| err_msg!(Report, "failed to serialize JSON report: {}", e).caused_by(e))
}

/// Writes the JSON report to `path`, creating parent directories.
pub fn write_report(run: &RunReport, path: &Path) -> Result<(), SeaQaError> {
    let json = render(run)?;
    super::write_file(path, &json)
}
