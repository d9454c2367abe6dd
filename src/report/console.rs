//! Human-readable console report.

use std::io;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorSpec, WriteColor};

use super::{
    format_duration, CaseResult, Mismatch, Outcome, RunReport, Status, Summary,
};

/// Writes per-case lines, failure details and the run summary.
pub struct ConsoleReporter<W: WriteColor> {
    out: W,
    show_output: bool,
}

impl<W: WriteColor> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_output: false,
        }
    }

    /// Also print captured output of passing cases.
    pub fn show_output(mut self, show: bool) -> Self {
        self.show_output = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the whole run and returns the process exit code for it.
    pub fn report(&mut self, run: &RunReport) -> io::Result<i32> {
        for suite in &run.suites {
            self.colored(Color::Cyan, true, &format!("Suite {}", suite.name))?;
            writeln!(self.out, " ({})", suite.path.display())?;
            if suite.results.is_empty() {
                writeln!(self.out, "  no cases")?;
            }
            for result in &suite.results {
                self.print_result(result)?;
            }
            writeln!(self.out)?;
        }

        for failure in &run.load_failures {
            self.colored(Color::Red, true, "LOAD ERROR")?;
            writeln!(self.out, " {}: {}", failure.path.display(), failure.message)?;
        }
        if !run.load_failures.is_empty() {
            writeln!(self.out)?;
        }

        self.print_summary(&run.summary(), run)?;
        self.out.flush()?;
        Ok(run.exit_code())
    }

    fn print_result(&mut self, result: &CaseResult) -> io::Result<()> {
        let status = result.status();
        self.colored(status_color(status), true, &format!("{:<5}", status.label()))?;
        match &result.outcome {
            Outcome::Skipped { reason } => writeln!(self.out, " {} ({})", result.name, reason)?,
            Outcome::Error { message } => writeln!(
                self.out,
                " {} ({}) {}",
                result.name,
                format_duration(result.duration),
                message
            )?,
            _ => writeln!(
                self.out,
                " {} ({})",
                result.name,
                format_duration(result.duration)
            )?,
        }

        if let Outcome::Fail { mismatches } = &result.outcome {
            for mismatch in mismatches {
                writeln!(self.out, "    - {mismatch}")?;
                if let Mismatch::Output {
                    expected, actual, ..
                } = mismatch
                {
                    self.print_diff(expected, actual)?;
                }
            }
        }

        let failed = matches!(status, Status::Fail | Status::Error);
        if let Some(actual) = &result.actual {
            if self.show_output && !actual.stdout.trim().is_empty() {
                self.print_block("stdout", &actual.stdout)?;
            }
            if (failed || self.show_output) && !actual.stderr.trim().is_empty() {
                self.print_block("stderr", &actual.stderr)?;
            }
        }
        Ok(())
    }

    /// Line diff of expected against actual output.
    fn print_diff(&mut self, expected: &str, actual: &str) -> io::Result<()> {
        writeln!(self.out, "      Diff:")?;
        let changeset = Changeset::new(expected, actual, "\n");
        for diff in &changeset.diffs {
            let (marker, color, text) = match diff {
                Difference::Same(x) => (' ', None, x),
                Difference::Add(x) => ('+', Some(Color::Red), x),
                Difference::Rem(x) => ('-', Some(Color::Green), x),
            };
            for line in text.lines() {
                match color {
                    Some(color) => {
                        self.colored(color, false, &format!("      {marker}{line}"))?;
                        writeln!(self.out)?;
                    }
                    None => writeln!(self.out, "      {marker}{line}")?,
                }
            }
        }
        Ok(())
    }

    fn print_block(&mut self, label: &str, text: &str) -> io::Result<()> {
        writeln!(self.out, "    {label}:")?;
        for line in text.trim_end().lines() {
            writeln!(self.out, "      | {line}")?;
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &Summary, run: &RunReport) -> io::Result<()> {
        write!(self.out, "Summary: ")?;
        self.colored(Color::Green, false, &format!("{} passed", summary.passed))?;
        write!(self.out, ", ")?;
        self.colored(Color::Red, false, &format!("{} failed", summary.failed))?;
        write!(self.out, ", ")?;
        self.colored(Color::Red, false, &format!("{} errors", summary.errored))?;
        write!(self.out, ", ")?;
        self.colored(Color::Yellow, false, &format!("{} skipped", summary.skipped))?;
        writeln!(
            self.out,
            " ({} total) in {}",
            summary.total(),
            format_duration(run.duration)
        )?;

        let failing: Vec<&str> = run
            .suites
            .iter()
            .flat_map(|s| s.results.iter())
            .filter(|r| matches!(r.status(), Status::Fail | Status::Error))
            .map(|r| r.name.as_str())
            .collect();
        if !failing.is_empty() {
            writeln!(self.out, "\nFailed cases:")?;
            for name in failing {
                writeln!(self.out, "  - {name}")?;
            }
        }
        Ok(())
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Pass => Color::Green,
        Status::Fail | Status::Error => Color::Red,
        Status::Skipped => Color::Yellow,
    }
}
