//! Runtime configuration for a single run.

use std::{path::PathBuf, time::Duration};

use clap::ValueEnum;
use termcolor::ColorChoice;

/// When to color console output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color only when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn color_choice(&self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Every knob that shapes a run, independent of where it came from.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Suite file or directory of suites.
    pub spec: PathBuf,
    /// Case-insensitive substring a case name must contain to run.
    pub filter: Option<String>,
    /// Timeout for cases whose suite sets none.
    pub default_timeout: Option<Duration>,
    pub color: ColorMode,
    /// Print captured output of every executed case, not only failures.
    pub show_output: bool,
    pub report_json: Option<PathBuf>,
    pub report_junit: Option<PathBuf>,
    pub report_csv: Option<PathBuf>,
    pub report_html: Option<PathBuf>,
    /// Number of `-v` flags.
    pub verbosity: u8,
}

impl RunConfig {
    pub fn new(spec: impl Into<PathBuf>) -> Self {
        Self {
            spec: spec.into(),
            ..Self::default()
        }
    }

    /// The filter normalized for matching, ignoring blank filters.
    pub fn normalized_filter(&self) -> Option<String> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase)
    }
}
