//! Compares captured output against an [`Expectation`].

use regex::Regex;

use crate::{
    report::{CapturedOutput, Mismatch, Stream},
    suite::Expectation,
};

/// Every way `actual` falls short of `expected`; empty means the case passed.
pub fn compare(expected: &Expectation, actual: &CapturedOutput) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    if let Some(code) = expected.exit_code {
        if actual.exit_code != Some(code) {
            mismatches.push(Mismatch::ExitCode {
                expected: code,
                actual: actual.exit_code,
            });
        }
    }

    check_stream(
        Stream::Stdout,
        &actual.stdout,
        expected.stdout.as_deref(),
        &expected.stdout_contains,
        expected.stdout_matches.as_ref(),
        &mut mismatches,
    );
    check_stream(
        Stream::Stderr,
        &actual.stderr,
        expected.stderr.as_deref(),
        &expected.stderr_contains,
        expected.stderr_matches.as_ref(),
        &mut mismatches,
    );

    mismatches
}

fn check_stream(
    stream: Stream,
    actual: &str,
    exact: Option<&str>,
    contains: &[String],
    pattern: Option<&Regex>,
    mismatches: &mut Vec<Mismatch>,
) {
    if let Some(expected) = exact {
        if !outputs_equal(expected, actual) {
            mismatches.push(Mismatch::Output {
                stream,
                expected: expected.trim().to_string(),
                actual: actual.trim().to_string(),
            });
        }
    }
    for needle in contains {
        if !actual.contains(needle.as_str()) {
            mismatches.push(Mismatch::MissingText {
                stream,
                needle: needle.clone(),
            });
        }
    }
    if let Some(re) = pattern {
        if !re.is_match(actual) {
            mismatches.push(Mismatch::PatternNotMatched {
                stream,
                pattern: re.as_str().to_string(),
            });
        }
    }
}

/// Exact comparison ignoring surrounding whitespace and CRLF line endings.
fn outputs_equal(expected: &str, actual: &str) -> bool {
    let normalize = |s: &str| s.trim().replace("\r\n", "\n");
    normalize(expected) == normalize(actual)
}
