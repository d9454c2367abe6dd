//! sea-qa: a command-line test harness driven by YAML suites.
//!
//! A suite lists command invocations and what each should produce. The
//! [`suite`] loader turns YAML into resolved cases, the [`runner`] executes
//! them and [`report`] renders the outcome for people and CI systems.

pub use crate::diagnostics::{ErrorContext, ErrorKind, SeaQaError};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod logging;
pub mod report;
pub mod runner;
pub mod suite;
