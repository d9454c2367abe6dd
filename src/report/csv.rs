//! Flat CSV report: one row per case, for spreadsheets and quick diffs.

use std::{borrow::Cow, path::Path};

use super::RunReport;
use crate::SeaQaError;

const HEADER: [&str; 5] = ["suite", "case", "status", "duration_ms", "message"];

/// Renders the run as CSV with a header row.
///
/// Suites that failed to load get one `error` row with an empty case name.
pub fn render(run: &RunReport) -> String {
    let mut csv = String::new();
    push_row(&mut csv, &HEADER);
    for suite in &run.suites {
        for result in &suite.results {
            let millis = result.duration.as_millis().to_string();
            let detail = result.detail();
            push_row(
                &mut csv,
                &[
                    suite.name.as_str(),
                    result.name.as_str(),
                    result.status().as_str(),
                    millis.as_str(),
                    detail.as_str(),
                ],
            );
        }
    }
    for failure in &run.load_failures {
        let path = failure.path.display().to_string();
        push_row(&mut csv, &[path.as_str(), "", "error", "0", failure.message.as_str()]);
    }
    csv
}

/// Writes the CSV report to `path`, creating parent directories.
pub fn write_report(run: &RunReport, path: &Path) -> Result<(), SeaQaError> {
    super::write_file(path, &render(run))
}

fn push_row(csv: &mut String, cells: &[&str]) {
    let row: Vec<Cow<'_, str>> = cells.iter().map(|c| quote(c)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Quotes a field when it holds a separator, quote or line break.
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
