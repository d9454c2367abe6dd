//! Unified, `miette`-based diagnostics for SEA-QA.
//!
//! Every failure the loader, executor or report writers can produce is a
//! [`SeaQaError`]. Each variant carries an [`ErrorContext`] with an optional
//! named source, a span into that source and a help line, so a malformed
//! suite file renders with the offending snippet highlighted.
//!
//! # Error Construction Macros
//!
//! - `err_msg!(Parse, "duplicate case name '{}'", name)` for message-only errors.
//! - `err_ctx!(Parse, message, src, span)` when a source and span are known.
//! - `err_ctx!(Parse, message, src, span, help)` to attach a help line.
//!
//! Pass `src` as a `&SourceArc`; the macros clone it.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// Byte range into a diagnostic source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }
}

/// Type-safe classification of [`SeaQaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The spec path does not exist.
    NotFound,
    /// The spec file is not a valid suite document.
    Parse,
    /// Reading a spec or writing a report failed at the OS level.
    Io,
    /// A case invocation could not be started or supervised.
    Execution,
    /// A report could not be produced.
    Report,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Parse => "Parse",
            ErrorKind::Io => "Io",
            ErrorKind::Execution => "Execution",
            ErrorKind::Report => "Report",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_help(help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..Self::default()
        }
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Every failure mode of the loader, executor and report writers.
#[derive(Debug, Error)]
pub enum SeaQaError {
    #[error("Spec not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Execution error: {message}")]
    Execution {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Report error: {message}")]
    Report {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl SeaQaError {
    pub fn not_found(path: &Path) -> Self {
        SeaQaError::NotFound {
            path: path.to_path_buf(),
            ctx: ErrorContext::with_help("check the --spec path; it must name a suite file or a directory of suites"),
            source: None,
        }
    }

    /// Wraps an I/O failure on `path`, mapping "not found" to [`SeaQaError::NotFound`].
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        SeaQaError::Io {
            message: format!("{}: {}", path.display(), err),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }

    fn get_ctx(&self) -> &ErrorContext {
        match self {
            SeaQaError::NotFound { ctx, .. } => ctx,
            SeaQaError::Parse { ctx, .. } => ctx,
            SeaQaError::Io { ctx, .. } => ctx,
            SeaQaError::Execution { ctx, .. } => ctx,
            SeaQaError::Report { ctx, .. } => ctx,
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            SeaQaError::NotFound { .. } => ErrorKind::NotFound,
            SeaQaError::Parse { .. } => ErrorKind::Parse,
            SeaQaError::Io { .. } => ErrorKind::Io,
            SeaQaError::Execution { .. } => ErrorKind::Execution,
            SeaQaError::Report { .. } => ErrorKind::Report,
        }
    }

    /// Attaches a cause to the error.
    pub fn caused_by<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let slot = match &mut self {
            SeaQaError::NotFound { source, .. }
            | SeaQaError::Parse { source, .. }
            | SeaQaError::Io { source, .. }
            | SeaQaError::Execution { source, .. }
            | SeaQaError::Report { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }

    fn label_text(&self) -> String {
        match self {
            SeaQaError::NotFound { path, .. } => path.display().to_string(),
            SeaQaError::Parse { message, .. }
            | SeaQaError::Io { message, .. }
            | SeaQaError::Execution { message, .. }
            | SeaQaError::Report { message, .. } => message.clone(),
        }
    }
}

impl Diagnostic for SeaQaError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("sea_qa::{}", self.error_kind().as_str().to_lowercase())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        // A span without a source has nothing to point into.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.label_text()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts file contents into a named diagnostic source.
pub fn to_error_source<S: AsRef<str>>(name: &Path, source: S) -> SourceArc {
    Arc::new(NamedSource::new(
        name.display().to_string(),
        source.as_ref().to_string(),
    ))
}

/// Constructs a [`SeaQaError`] variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($arg:tt)+) => {
        $crate::SeaQaError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a [`SeaQaError`] variant pointing into a source, with an optional help line.
#[macro_export]
macro_rules! err_ctx {
    // Message, src, span, help
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::SeaQaError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    // Message, src, span
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::SeaQaError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn parse_error_renders_snippet_and_help() {
        let src = to_error_source(Path::new("suite.yaml"), "cases:\n  - name: [oops\n");
        let err = err_ctx!(
            Parse,
            "unterminated flow sequence",
            &src,
            Span { start: 17, end: 22 },
            "close the bracket"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("unterminated flow sequence"));
        assert!(output.contains("close the bracket"));
        assert!(output.contains("suite.yaml"));
    }

    #[test]
    fn io_not_found_becomes_not_found() {
        let err = SeaQaError::io(
            Path::new("missing.yaml"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.error_kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Spec not found: missing.yaml");
    }

    #[test]
    fn message_only_errors_have_no_labels() {
        let err = err_msg!(Execution, "failed to spawn '{}'", "nope");
        assert_eq!(err.error_kind(), ErrorKind::Execution);
        assert!(err.labels().is_none());
        assert_eq!(err.to_string(), "Execution error: failed to spawn 'nope'");
    }

    #[test]
    fn causes_are_chained() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = err_msg!(Report, "could not write report").caused_by(cause);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("could not write report"));
        assert!(output.contains("disk full"));
    }

    #[test]
    fn source_is_exposed_only_when_a_cause_is_attached() {
        use std::error::Error as _;

        let bare = err_msg!(Io, "nothing underneath");
        assert!(bare.source().is_none());

        let cause = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let wrapped = err_msg!(Io, "could not read suite").caused_by(cause);
        assert_eq!(wrapped.source().map(|s| s.to_string()).as_deref(), Some("locked"));
    }
}
