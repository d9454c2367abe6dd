//! The sea-qa command-line interface.
//!
//! Parses arguments, loads the suites, runs them and writes every requested
//! report. Returns the process exit code instead of exiting so the binary
//! stays a one-liner.

use clap::Parser;
use termcolor::StandardStream;
use tracing::info;

use crate::{
    cli::args::SeaQaArgs,
    config::RunConfig,
    err_msg,
    logging,
    report::{self, ConsoleReporter, RunReport, FAILURE_CODE},
    runner::Executor,
    suite::load_suites,
    SeaQaError,
};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> i32 {
    let Some(config) = SeaQaArgs::parse().into_config() else {
        println!("{}", output::USAGE);
        return FAILURE_CODE;
    };
    logging::init(config.verbosity);

    match run_with_config(&config) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(e);
            FAILURE_CODE
        }
    }
}

/// Loads, runs and reports according to `config`; returns the exit code.
pub fn run_with_config(config: &RunConfig) -> Result<i32, SeaQaError> {
    let loaded = load_suites(&config.spec)?;
    info!(
        suites = loaded.suites.len(),
        failures = loaded.failures.len(),
        spec = %config.spec.display(),
        "suites loaded"
    );

    let run = Executor::new(config).run_all(&loaded);

    let stdout = StandardStream::stdout(config.color.color_choice());
    let code = ConsoleReporter::new(stdout)
        .show_output(config.show_output)
        .report(&run)
        .map_err(|e| err_msg!(Io, "failed to write console report: {}", e).caused_by(e))?;

    write_reports(config, &run)?;
    println!("{}", output::completion_line(&run));
    Ok(code)
}

fn write_reports(config: &RunConfig, run: &RunReport) -> Result<(), SeaQaError> {
    if let Some(path) = &config.report_json {
        report::json::write_report(run, path)?;
        info!(path = %path.display(), "wrote JSON report");
    }
    if let Some(path) = &config.report_junit {
        report::junit::write_report(run, path)?;
        info!(path = %path.display(), "wrote JUnit report");
    }
    if let Some(path) = &config.report_csv {
        report::csv::write_report(run, path)?;
        info!(path = %path.display(), "wrote CSV report");
    }
    if let Some(path) = &config.report_html {
        report::html::write_report(run, path)?;
        info!(path = %path.display(), "wrote HTML report");
    }
    Ok(())
}
