//! Standalone HTML report with a status-colored results table.

use std::{fmt::Write as _, path::Path};

use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;

use super::{format_duration, RunReport, Status};
use crate::SeaQaError;

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background: #eee; }
td.detail { font-family: monospace; white-space: pre-wrap; }
tr.pass td.status { background: #d4edda; }
tr.fail td.status { background: #f8d7da; }
tr.error td.status { background: #f5c6cb; font-weight: bold; }
tr.skipped td.status { background: #fff3cd; }
";

/// Renders the run as a self-contained HTML page.
pub fn render(run: &RunReport) -> String {
    let summary = run.summary();
    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{name} report</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n\
         <h1>{name} report</h1>\n\
         <p>Generated {generated}. {passed} passed, {failed} failed, {errored} errors, \
         {skipped} skipped ({total} total) in {duration}.</p>\n",
        name = env!("CARGO_PKG_NAME"),
        generated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        skipped = summary.skipped,
        total = summary.total(),
        duration = format_duration(run.duration),
    );

    html.push_str(
        "<table>\n<tr><th>Suite</th><th>Case</th><th>Status</th>\
         <th>Duration</th><th>Detail</th></tr>\n",
    );
    for suite in &run.suites {
        for result in &suite.results {
            push_row(
                &mut html,
                &suite.name,
                &result.name,
                result.status(),
                &format_duration(result.duration),
                &result.detail(),
            );
        }
    }
    for failure in &run.load_failures {
        push_row(
            &mut html,
            &failure.path.display().to_string(),
            "",
            Status::Error,
            "",
            &failure.message,
        );
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Writes the HTML report to `path`, creating parent directories.
pub fn write_report(run: &RunReport, path: &Path) -> Result<(), SeaQaError> {
    super::write_file(path, &render(run))
}

fn push_row(html: &mut String, suite: &str, case: &str, status: Status, duration: &str, detail: &str) {
    let _ = writeln!(
        html,
        "<tr class=\"{class}\"><td>{suite}</td><td>{case}</td><td class=\"status\">{label}</td>\
         <td>{duration}</td><td class=\"detail\">{detail}</td></tr>",
        class = status.as_str(),
        suite = escape(suite),
        case = escape(case),
        label = status.label(),
        duration = duration,
        detail = escape(detail),
    );
}
