//! Command-line arguments for `sea-qa`.

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};

use crate::config::{ColorMode, RunConfig};

/// Runs YAML-described command-line test suites and reports the results.
#[derive(Debug, Parser)]
#[command(name = "sea-qa", version)]
pub struct SeaQaArgs {
    /// Suite file, or a directory searched for `*.yaml` / `*.yml` suites.
    ///
    /// Optional to clap so a missing flag is reported with the usage line
    /// and exit code 1.
    #[arg(long, value_name = "PATH")]
    pub spec: Option<PathBuf>,

    /// Only run cases whose name contains this text (case-insensitive).
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Timeout for cases that set none themselves.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Write a JSON report to this path.
    #[arg(long, value_name = "PATH")]
    pub report_json: Option<PathBuf>,

    /// Write a JUnit XML report to this path.
    #[arg(long, value_name = "PATH")]
    pub report_junit: Option<PathBuf>,

    /// Write a CSV report, one row per case, to this path.
    #[arg(long, value_name = "PATH")]
    pub report_csv: Option<PathBuf>,

    /// Write an HTML report to this path.
    #[arg(long, value_name = "PATH")]
    pub report_html: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Raise log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print captured output for every executed case.
    #[arg(long)]
    pub show_output: bool,
}

impl SeaQaArgs {
    /// Builds the run configuration, or `None` when no spec was given.
    pub fn into_config(self) -> Option<RunConfig> {
        let spec = self.spec?;
        Some(RunConfig {
            spec,
            filter: self.filter,
            default_timeout: self.timeout_ms.map(Duration::from_millis),
            color: self.color,
            show_output: self.show_output,
            report_json: self.report_json,
            report_junit: self.report_junit,
            report_csv: self.report_csv,
            report_html: self.report_html,
            verbosity: self.verbose,
        })
    }
}
