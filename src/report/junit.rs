//! JUnit XML report, for CI systems that ingest test results.

use std::{borrow::Cow, io::Write, path::Path, time::Duration};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use super::{CaseResult, LoadFailure, Outcome, RunReport, Summary, SuiteReport};
use crate::{err_msg, SeaQaError};

type XmlResult = Result<(), quick_xml::Error>;

/// Renders the run as a JUnit `testsuites` document.
pub fn render(run: &RunReport) -> Result<String, SeaQaError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    write_document(&mut writer, run)
        .map_err(|e| err_msg!(Report, "failed to render JUnit report: {}", e).caused_by(e))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| err_msg!(Report, "JUnit report is not valid UTF-8: {}", e).caused_by(e))
}

/// Writes the JUnit report to `path`, creating parent directories.
pub fn write_report(run: &RunReport, path: &Path) -> Result<(), SeaQaError> {
    let xml = render(run)?;
    super::write_file(path, &xml)
}

fn write_document<W: Write>(writer: &mut Writer<W>, run: &RunReport) -> XmlResult {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = run.summary();
    let mut root = BytesStart::new("testsuites");
    root.push_attribute(("name", env!("CARGO_PKG_NAME")));
    push_counts(&mut root, &summary, run.load_failures.len());
    root.push_attribute(("time", seconds(run.duration).as_str()));
    writer.write_event(Event::Start(root))?;

    for suite in &run.suites {
        write_suite(writer, suite)?;
    }
    for failure in &run.load_failures {
        write_load_failure(writer, failure)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;
    Ok(())
}

fn write_suite<W: Write>(writer: &mut Writer<W>, suite: &SuiteReport) -> XmlResult {
    let mut tag = BytesStart::new("testsuite");
    tag.push_attribute(("name", xml_safe(&suite.name).as_ref()));
    push_counts(&mut tag, &suite.summary(), 0);
    tag.push_attribute(("time", seconds(suite.duration).as_str()));
    tag.push_attribute(("file", suite.path.display().to_string().as_str()));

    if suite.results.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }
    writer.write_event(Event::Start(tag))?;
    for result in &suite.results {
        write_case(writer, &suite.name, result)?;
    }
    writer.write_event(Event::End(BytesEnd::new("testsuite")))
}

fn write_case<W: Write>(writer: &mut Writer<W>, classname: &str, result: &CaseResult) -> XmlResult {
    let mut tag = BytesStart::new("testcase");
    tag.push_attribute(("name", xml_safe(&result.name).as_ref()));
    tag.push_attribute(("classname", xml_safe(classname).as_ref()));
    tag.push_attribute(("time", seconds(result.duration).as_str()));

    let has_output = result
        .actual
        .as_ref()
        .map_or(false, |a| !a.stdout.is_empty() || !a.stderr.is_empty());
    if result.outcome == Outcome::Pass && !has_output {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    match &result.outcome {
        Outcome::Pass => {}
        Outcome::Fail { mismatches } => {
            let summary = mismatches
                .first()
                .map(|m| m.to_string())
                .unwrap_or_default();
            let detail = mismatches
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            write_text_element(writer, "failure", Some(summary.as_str()), &detail)?;
        }
        Outcome::Error { message } => {
            write_text_element(writer, "error", Some(message.as_str()), message)?
        }
        Outcome::Skipped { reason } => {
            let mut skipped = BytesStart::new("skipped");
            skipped.push_attribute(("message", xml_safe(reason).as_ref()));
            writer.write_event(Event::Empty(skipped))?;
        }
    }
    if let Some(actual) = &result.actual {
        if !actual.stdout.is_empty() {
            write_text_element(writer, "system-out", None, &actual.stdout)?;
        }
        if !actual.stderr.is_empty() {
            write_text_element(writer, "system-err", None, &actual.stderr)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("testcase")))
}

fn write_load_failure<W: Write>(writer: &mut Writer<W>, failure: &LoadFailure) -> XmlResult {
    let path = failure.path.display().to_string();
    let mut tag = BytesStart::new("testsuite");
    tag.push_attribute(("name", path.as_str()));
    tag.push_attribute(("tests", "1"));
    tag.push_attribute(("failures", "0"));
    tag.push_attribute(("errors", "1"));
    tag.push_attribute(("skipped", "0"));
    tag.push_attribute(("time", "0.000"));
    writer.write_event(Event::Start(tag))?;

    let mut case = BytesStart::new("testcase");
    case.push_attribute(("name", "load"));
    case.push_attribute(("classname", path.as_str()));
    case.push_attribute(("time", "0.000"));
    writer.write_event(Event::Start(case))?;
    write_text_element(writer, "error", Some(failure.message.as_str()), &failure.message)?;
    writer.write_event(Event::End(BytesEnd::new("testcase")))?;

    writer.write_event(Event::End(BytesEnd::new("testsuite")))
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    message: Option<&str>,
    text: &str,
) -> XmlResult {
    let mut tag = BytesStart::new(name);
    if let Some(message) = message {
        tag.push_attribute(("message", xml_safe(message).as_ref()));
    }
    writer.write_event(Event::Start(tag))?;
    writer.write_event(Event::Text(BytesText::new(&xml_safe(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn push_counts(tag: &mut BytesStart<'_>, summary: &Summary, load_errors: usize) {
    tag.push_attribute(("tests", (summary.total() + load_errors).to_string().as_str()));
    tag.push_attribute(("failures", summary.failed.to_string().as_str()));
    tag.push_attribute(("errors", (summary.errored + load_errors).to_string().as_str()));
    tag.push_attribute(("skipped", summary.skipped.to_string().as_str()));
}

/// Replaces characters XML 1.0 cannot carry, such as the escape in ANSI color
/// codes, with U+FFFD.
fn xml_safe(text: &str) -> Cow<'_, str> {
    let invalid = |c: char| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r');
    if text.contains(invalid) {
        Cow::Owned(
            text.chars()
                .map(|c| if invalid(c) { '\u{FFFD}' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::report::{CapturedOutput, Mismatch};

    fn run() -> RunReport {
        RunReport {
            suites: vec![SuiteReport {
                name: "cli".to_string(),
                path: PathBuf::from("specs/cli.yaml"),
                results: vec![
                    CaseResult {
                        name: "help".to_string(),
                        outcome: Outcome::Pass,
                        actual: None,
                        duration: Duration::from_millis(2),
                    },
                    CaseResult {
                        name: "flags <bad>".to_string(),
                        outcome: Outcome::Fail {
                            mismatches: vec![Mismatch::ExitCode {
                                expected: 2,
                                actual: Some(0),
                            }],
                        },
                        actual: Some(CapturedOutput {
                            stdout: String::new(),
                            stderr: "oops & more".to_string(),
                            exit_code: Some(0),
                        }),
                        duration: Duration::from_millis(3),
                    },
                    CaseResult::skipped("later", "Marked 'skip'"),
                ],
                duration: Duration::from_millis(5),
            }],
            load_failures: vec![LoadFailure {
                path: PathBuf::from("specs/broken.yaml"),
                message: "Parse error: bad".to_string(),
            }],
            duration: Duration::from_millis(6),
        }
    }

    #[test]
    fn renders_counts_and_case_elements() {
        let xml = render(&run()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<testsuites name="sea-qa" tests="4" failures="1" errors="1" skipped="1""#));
        assert!(xml.contains(r#"<testsuite name="cli" tests="3" failures="1" errors="0" skipped="1""#));
        assert!(xml.contains(r#"<testcase name="help" classname="cli" time="0.002"/>"#));
        assert!(xml.contains(r#"<failure message="expected exit code 2, got 0">"#));
        assert!(xml.contains(r#"<skipped message="Marked &apos;skip&apos;"/>"#));
        assert!(xml.contains("<system-err>oops &amp; more</system-err>"));
        assert!(xml.contains("flags &lt;bad&gt;"));
        assert!(xml.contains(r#"<testsuite name="specs/broken.yaml""#));
    }

    #[test]
    fn control_characters_are_replaced() {
        let mut run = RunReport::default();
        run.suites.push(SuiteReport {
            name: "colors".to_string(),
            path: PathBuf::from("colors.yaml"),
            results: vec![CaseResult {
                name: "red".to_string(),
                outcome: Outcome::Error {
                    message: "bad \u{1b}[1mstate".to_string(),
                },
                actual: Some(CapturedOutput {
                    stdout: "\u{1b}[31mred\u{1b}[0m\ttab\n".to_string(),
                    stderr: "bell\u{7}".to_string(),
                    exit_code: Some(0),
                }),
                duration: Duration::from_millis(1),
            }],
            duration: Duration::from_millis(1),
        });

        let xml = render(&run).unwrap();
        assert!(!xml.chars().any(|c| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')));
        assert!(xml.contains("<system-out>\u{FFFD}[31mred\u{FFFD}[0m\ttab\n</system-out>"));
        assert!(xml.contains("<system-err>bell\u{FFFD}</system-err>"));
        assert!(xml.contains("<error message=\"bad \u{FFFD}[1mstate\">"));
    }

    #[test]
    fn empty_run_is_a_valid_document() {
        let xml = render(&RunReport::default()).unwrap();
        assert!(xml.contains(r#"tests="0" failures="0" errors="0" skipped="0""#));
        assert!(xml.trim_end().ends_with("</testsuites>"));
    }
}
