//! Loading suites from disk: single files, directories and broken input.

mod common;

use std::time::Duration;

use common::{fixture, scratch_suite};
use pretty_assertions::assert_eq;
use sea_qa::{
    suite::{load_suite, load_suites},
    ErrorKind,
};

#[test]
fn mapping_suite_resolves_defaults_into_cases() {
    let suite = load_suite(&fixture("passing.yaml")).unwrap();
    assert_eq!(suite.name, "passing");
    assert_eq!(suite.cases.len(), 3);

    let first = &suite.cases[0];
    assert_eq!(first.name, "echo greets");
    assert_eq!(first.input.env.get("GREETING").map(String::as_str), Some("hello"));
    assert_eq!(first.timeout, Some(Duration::from_millis(5000)));
    assert_eq!(first.input.cwd, fixture(""));
    assert_eq!(first.expected.stdout.as_deref(), Some("hello world"));

    assert_eq!(suite.cases[1].expected.exit_code, Some(3));
    assert_eq!(suite.cases[2].input.program, "cat");
    assert_eq!(suite.cases[2].input.stdin.as_deref(), Some("line one\nline two\n"));
}

#[test]
fn comment_only_document_is_an_empty_suite() {
    let suite = load_suite(&fixture("empty.yaml")).unwrap();
    assert!(suite.is_empty());
    assert_eq!(suite.name, "empty");
}

#[test]
fn unknown_fields_are_parse_errors() {
    let err = load_suite(&fixture("malformed.yaml")).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("expectations"), "{err}");
}

#[test]
fn missing_file_is_not_found() {
    let err = load_suites(&fixture("does-not-exist.yaml")).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::NotFound);
}

#[test]
fn directory_load_keeps_going_past_broken_suites() {
    let loaded = load_suites(&fixture("dir")).unwrap();
    assert_eq!(loaded.suites.len(), 1);
    assert_eq!(loaded.suites[0].name, "good");
    assert_eq!(loaded.failures.len(), 1);
    assert!(loaded.failures[0].0.ends_with("broken.yml"));
    assert_eq!(loaded.failures[0].1.error_kind(), ErrorKind::Parse);
}

#[test]
fn duplicate_names_are_rejected() {
    let (_dir, path) = scratch_suite(
        "dupes.yaml",
        "- name: same\n  command: [\"true\"]\n- name: same\n  command: [\"true\"]\n",
    );
    let err = load_suite(&path).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("duplicate case name 'same'"));
}

#[test]
fn command_and_shell_are_mutually_exclusive() {
    let (_dir, path) = scratch_suite(
        "both.yaml",
        "- name: both\n  command: [\"echo\"]\n  shell: echo hi\n",
    );
    let err = load_suite(&path).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::Parse);
}
