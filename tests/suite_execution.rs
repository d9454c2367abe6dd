//! Running loaded suites end to end through the executor.
#![cfg(unix)]

mod common;

use common::{fixture, scratch_suite};
use pretty_assertions::assert_eq;
use sea_qa::{
    config::RunConfig,
    report::{Mismatch, Outcome, Status, Stream},
    runner::Executor,
    suite::{load_suite, load_suites},
};

fn statuses(path: &std::path::Path, config: &RunConfig) -> Vec<(String, Status)> {
    let suite = load_suite(path).unwrap();
    Executor::new(config)
        .run_suite(&suite)
        .results
        .into_iter()
        .map(|r| (r.name.clone(), r.status()))
        .collect()
}

#[test]
fn passing_fixture_passes() {
    let config = RunConfig::new(fixture("passing.yaml"));
    let loaded = load_suites(&config.spec).unwrap();
    let run = Executor::new(&config).run_all(&loaded);
    let summary = run.summary();
    assert_eq!((summary.passed, summary.failed, summary.errored), (3, 0, 0));
    assert_eq!(run.exit_code(), 0);
}

#[test]
fn output_mismatch_is_a_failure_with_details() {
    let config = RunConfig::new(fixture("mixed.yaml"));
    let suite = load_suite(&config.spec).unwrap();
    let report = Executor::new(&config).run_suite(&suite);

    assert_eq!(report.results[0].status(), Status::Pass);
    let Outcome::Fail { mismatches } = &report.results[1].outcome else {
        panic!("expected a failure, got {:?}", report.results[1].outcome);
    };
    assert_eq!(
        mismatches,
        &vec![Mismatch::Output {
            stream: Stream::Stdout,
            expected: "expected".to_string(),
            actual: "actual".to_string(),
        }]
    );
}

#[test]
fn timeout_is_an_error_and_later_cases_still_run() {
    let (_dir, path) = scratch_suite(
        "slow.yaml",
        r#"
cases:
  - name: hangs
    command: [sleep, "5"]
    timeout_ms: 100
  - name: after
    shell: echo still running
    expect:
      stdout_contains: [still]
"#,
    );
    let suite = load_suite(&path).unwrap();
    let report = Executor::new(&RunConfig::new(&path)).run_suite(&suite);

    let Outcome::Error { message } = &report.results[0].outcome else {
        panic!("expected a timeout error");
    };
    assert_eq!(message, "timed out after 100ms");
    assert_eq!(report.results[1].status(), Status::Pass);
}

#[test]
fn cli_default_timeout_applies_when_the_suite_sets_none() {
    let (_dir, path) = scratch_suite("slow.yaml", "- name: hangs\n  command: [sleep, \"5\"]\n");
    let mut config = RunConfig::new(&path);
    config.default_timeout = Some(std::time::Duration::from_millis(100));
    assert_eq!(statuses(&path, &config), vec![("hangs".to_string(), Status::Error)]);
}

#[test]
fn missing_program_does_not_stop_the_suite() {
    let (_dir, path) = scratch_suite(
        "missing.yaml",
        "- name: absent\n  command: [sea-qa-no-such-binary]\n- name: present\n  command: [\"true\"]\n",
    );
    assert_eq!(
        statuses(&path, &RunConfig::new(&path)),
        vec![
            ("absent".to_string(), Status::Error),
            ("present".to_string(), Status::Pass),
        ]
    );
}

#[test]
fn only_skip_and_filter_leave_the_exit_code_alone() {
    let (_dir, path) = scratch_suite(
        "select.yaml",
        r#"
- name: focused greeting
  shell: echo hi
  only: true
- name: focused but skipped
  shell: exit 1
  only: true
  skip: true
- name: unfocused
  shell: exit 1
- name: focused farewell
  shell: exit 1
  only: true
"#,
    );
    let mut config = RunConfig::new(&path);
    config.filter = Some("GREETING".to_string());
    let suite = load_suite(&path).unwrap();
    let report = Executor::new(&config).run_suite(&suite);

    let got: Vec<Status> = report.results.iter().map(|r| r.status()).collect();
    assert_eq!(
        got,
        vec![Status::Pass, Status::Skipped, Status::Skipped, Status::Skipped]
    );
    assert!(report.summary().all_passed());
}

#[test]
fn any_exit_code_is_accepted_when_unset() {
    let (_dir, path) = scratch_suite(
        "any.yaml",
        "- name: crashes\n  shell: echo boom >&2; exit 7\n  expect:\n    exit_code: ~\n    stderr: boom\n",
    );
    assert_eq!(
        statuses(&path, &RunConfig::new(&path)),
        vec![("crashes".to_string(), Status::Pass)]
    );
}

#[test]
fn background_process_holding_stdout_is_bounded_by_the_timeout() {
    let (_dir, path) = scratch_suite(
        "background.yaml",
        "- name: bg\n  shell: sleep 3 & echo hi\n  timeout_ms: 200\n",
    );
    let started = std::time::Instant::now();
    assert_eq!(
        statuses(&path, &RunConfig::new(&path)),
        vec![("bg".to_string(), Status::Error)]
    );
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[test]
fn case_runs_in_its_working_directory() {
    let (dir, path) = scratch_suite(
        "cwd.yaml",
        "- name: where\n  command: [pwd]\n  cwd: nested/inner\n",
    );
    let target = dir.path().join("nested/inner");
    std::fs::create_dir_all(&target).unwrap();

    let suite = load_suite(&path).unwrap();
    let report = Executor::new(&RunConfig::new(&path)).run_suite(&suite);
    let actual = report.results[0].actual.as_ref().unwrap();
    assert_eq!(
        std::fs::canonicalize(actual.stdout.trim()).unwrap(),
        std::fs::canonicalize(&target).unwrap()
    );
}
