//! In-memory suite model and the raw document shapes it is loaded from.
//!
//! The `*Spec` types mirror the YAML document one-to-one and are what serde
//! deserializes. The loader resolves them (defaults merged, regexes compiled,
//! paths anchored at the suite file) into [`Suite`] and [`Case`], which the
//! executor consumes.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use regex::Regex;
use serde::Deserialize;

pub mod discovery;
pub mod loader;

pub use discovery::discover_suite_files;
pub use loader::{load_suite, load_suite_str, load_suites, LoadedSuites};

// ============================================================================
// RESOLVED MODEL
// ============================================================================

/// A named, ordered collection of cases loaded from one suite file.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub path: PathBuf,
    pub cases: Vec<Case>,
}

impl Suite {
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// True when at least one case is marked `only`.
    pub fn has_only(&self) -> bool {
        self.cases.iter().any(|c| c.only)
    }
}

/// A single test unit: what to run and what should come out of it.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub input: Invocation,
    pub expected: Expectation,
    pub timeout: Option<Duration>,
    pub skip: bool,
    pub only: bool,
}

/// The input payload of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// The command line as a single display string.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The expected outcome of a case.
#[derive(Debug, Clone)]
pub struct Expectation {
    /// `None` accepts any exit code.
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stdout_contains: Vec<String>,
    pub stdout_matches: Option<Regex>,
    pub stderr: Option<String>,
    pub stderr_contains: Vec<String>,
    pub stderr_matches: Option<Regex>,
}

impl Default for Expectation {
    fn default() -> Self {
        Self {
            exit_code: Some(0),
            stdout: None,
            stdout_contains: Vec::new(),
            stdout_matches: None,
            stderr: None,
            stderr_contains: Vec::new(),
            stderr_matches: None,
        }
    }
}

// ============================================================================
// DOCUMENT SHAPES
// ============================================================================

/// Top-level mapping form of a suite document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteSpec {
    pub name: Option<String>,
    #[serde(default)]
    pub defaults: DefaultsSpec,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

/// Settings applied to every case of a suite unless the case overrides them.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSpec {
    #[serde(default)]
    pub command: Vec<String>,
    pub shell: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
}

/// One entry of the `cases` list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub command: Vec<String>,
    pub shell: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub stdin: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub expect: ExpectSpec,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
}

/// The `expect` block of a case.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    #[serde(default = "default_exit_code")]
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    #[serde(default)]
    pub stdout_contains: Vec<String>,
    pub stdout_matches: Option<String>,
    pub stderr: Option<String>,
    #[serde(default)]
    pub stderr_contains: Vec<String>,
    pub stderr_matches: Option<String>,
}

impl Default for ExpectSpec {
    fn default() -> Self {
        Self {
            exit_code: default_exit_code(),
            stdout: None,
            stdout_contains: Vec::new(),
            stdout_matches: None,
            stderr: None,
            stderr_contains: Vec::new(),
            stderr_matches: None,
        }
    }
}

fn default_exit_code() -> Option<i32> {
    Some(0)
}
