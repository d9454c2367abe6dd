//! Diagnostic logging for the harness itself.
//!
//! Logs go to stderr so they never mix with the report on stdout.

use tracing_subscriber::{fmt, EnvFilter};

/// Level used when `RUST_LOG` is not set, by number of `-v` flags.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise the verbosity level.
pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8) {
    let _ = fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .compact()
        .try_init();
}
