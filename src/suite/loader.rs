//! Suite loader: turns a suite file into a [`Suite`].
//!
//! A document is either a mapping (`name`, `defaults`, `cases`) or a bare
//! list of cases. An empty document is an empty suite. Everything else that
//! does not fit the schema is a [`SeaQaError::Parse`] pointing into the file.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use regex::Regex;
use tracing::{debug, warn};

use super::{
    discovery::discover_suite_files, Case, CaseSpec, DefaultsSpec, ExpectSpec, Expectation,
    Invocation, Suite, SuiteSpec,
};
use crate::{
    diagnostics::{to_error_source, SourceArc, Span},
    err_ctx, ErrorContext, SeaQaError,
};

/// The outcome of loading every suite under a spec path.
#[derive(Debug, Default)]
pub struct LoadedSuites {
    pub suites: Vec<Suite>,
    /// Suite files that could not be loaded; the rest still run.
    pub failures: Vec<(PathBuf, SeaQaError)>,
}

/// Loads a single suite file.
pub fn load_suite(path: &Path) -> Result<Suite, SeaQaError> {
    if !path.exists() {
        return Err(SeaQaError::not_found(path));
    }
    let content = fs::read_to_string(path).map_err(|e| SeaQaError::io(path, e))?;
    load_suite_str(&content, path)
}

/// Loads a suite from `content`, treating `path` as its origin.
///
/// Relative working directories in the document resolve against the parent
/// of `path`.
pub fn load_suite_str(content: &str, path: &Path) -> Result<Suite, SeaQaError> {
    let src = to_error_source(path, content);
    let spec = parse_document(content, &src)?;
    let name = spec
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| suite_name_from_path(path));
    let base_dir = base_dir_of(path);

    check_defaults(&spec.defaults, &src)?;
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut cases = Vec::with_capacity(spec.cases.len());
    for (index, case) in spec.cases.iter().enumerate() {
        if case.name.trim().is_empty() {
            return Err(SeaQaError::Parse {
                message: format!("case #{} has an empty name", index + 1),
                ctx: ErrorContext {
                    source: Some(SourceArc::clone(&src)),
                    span: None,
                    help: Some("every case needs a unique, non-empty `name`".to_string()),
                },
                source: None,
            });
        }
        if let Some(first) = seen.insert(case.name.as_str(), index) {
            let span = locate_case_name(content, &case.name, 1).unwrap_or_default();
            return Err(err_ctx!(
                Parse,
                format!("duplicate case name '{}'", case.name),
                &src,
                span,
                format!(
                    "case #{} reuses the name of case #{}; names must be unique within a suite",
                    index + 1,
                    first + 1
                )
            ));
        }
        cases.push(resolve_case(case, &spec.defaults, &base_dir, content, &src)?);
    }

    debug!(suite = %name, cases = cases.len(), path = %path.display(), "loaded suite");
    Ok(Suite {
        name,
        path: path.to_path_buf(),
        cases,
    })
}

/// Loads every suite named by `path`: a single file, or all suite files
/// below a directory.
///
/// A missing single file is fatal. Inside a directory, a suite that fails to
/// load is recorded in [`LoadedSuites::failures`] and the others still load.
pub fn load_suites(path: &Path) -> Result<LoadedSuites, SeaQaError> {
    if !path.exists() {
        return Err(SeaQaError::not_found(path));
    }
    if !path.is_dir() {
        return Ok(LoadedSuites {
            suites: vec![load_suite(path)?],
            failures: Vec::new(),
        });
    }

    let mut loaded = LoadedSuites::default();
    for file in discover_suite_files(path)? {
        match load_suite(&file) {
            Ok(suite) => loaded.suites.push(suite),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "failed to load suite");
                loaded.failures.push((file, e));
            }
        }
    }
    Ok(loaded)
}

// ============================================================================
// PARSING
// ============================================================================

fn parse_document(content: &str, src: &SourceArc) -> Result<SuiteSpec, SeaQaError> {
    let shape: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| yaml_error(e, src))?;
    match shape {
        serde_yaml::Value::Null => Ok(SuiteSpec::default()),
        serde_yaml::Value::Sequence(_) => {
            let cases: Vec<CaseSpec> =
                serde_yaml::from_str(content).map_err(|e| yaml_error(e, src))?;
            Ok(SuiteSpec {
                cases,
                ..SuiteSpec::default()
            })
        }
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_str(content).map_err(|e| yaml_error(e, src))
        }
        _ => Err(err_ctx!(
            Parse,
            "suite document must be a mapping or a list of cases",
            src,
            Span::at(0),
            "start the file with `cases:` or with a `- name: ...` list entry"
        )),
    }
}

fn yaml_error(err: serde_yaml::Error, src: &SourceArc) -> SeaQaError {
    let span = err.location().map(|loc| Span::at(loc.index()));
    SeaQaError::Parse {
        message: err.to_string(),
        ctx: ErrorContext {
            source: Some(SourceArc::clone(src)),
            span,
            help: None,
        },
        source: None,
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

fn check_defaults(defaults: &DefaultsSpec, src: &SourceArc) -> Result<(), SeaQaError> {
    if defaults.shell.is_some() && !defaults.command.is_empty() {
        return Err(err_ctx!(
            Parse,
            "`defaults` sets both `command` and `shell`",
            src,
            Span::at(0),
            "use `command` for an argv list or `shell` for a command line, not both"
        ));
    }
    if defaults.timeout_ms == Some(0) {
        return Err(err_ctx!(
            Parse,
            "`defaults.timeout_ms` must be greater than zero",
            src,
            Span::at(0)
        ));
    }
    Ok(())
}

fn resolve_case(
    case: &CaseSpec,
    defaults: &DefaultsSpec,
    base_dir: &Path,
    content: &str,
    src: &SourceArc,
) -> Result<Case, SeaQaError> {
    let span = locate_case_name(content, &case.name, 0).unwrap_or_default();
    if case.shell.is_some() && !case.command.is_empty() {
        return Err(err_ctx!(
            Parse,
            format!("case '{}' sets both `command` and `shell`", case.name),
            src,
            span,
            "use `command` for an argv list or `shell` for a command line, not both"
        ));
    }

    let argv = if let Some(line) = &case.shell {
        shell_argv(line)
    } else if !case.command.is_empty() {
        case.command.clone()
    } else if let Some(line) = &defaults.shell {
        shell_argv(line)
    } else {
        defaults.command.clone()
    };
    let Some((program, rest)) = argv.split_first() else {
        return Err(err_ctx!(
            Parse,
            format!("case '{}' has no command", case.name),
            src,
            span,
            "set `command` or `shell` on the case, or a `command` under `defaults`"
        ));
    };

    let timeout_ms = case.timeout_ms.or(defaults.timeout_ms);
    if timeout_ms == Some(0) {
        return Err(err_ctx!(
            Parse,
            format!("case '{}' has a zero timeout", case.name),
            src,
            span,
            "`timeout_ms` must be greater than zero"
        ));
    }

    let mut env: BTreeMap<String, String> = defaults.env.clone();
    env.extend(case.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let cwd = match case.cwd.as_ref().or(defaults.cwd.as_ref()) {
        Some(dir) => base_dir.join(dir),
        None => base_dir.to_path_buf(),
    };

    let mut args = rest.to_vec();
    args.extend(case.args.iter().cloned());

    Ok(Case {
        name: case.name.clone(),
        input: Invocation {
            program: program.clone(),
            args,
            stdin: case.stdin.clone(),
            env,
            cwd,
        },
        expected: resolve_expectation(&case.expect, &case.name, span, src)?,
        timeout: timeout_ms.map(Duration::from_millis),
        skip: case.skip,
        only: case.only,
    })
}

fn resolve_expectation(
    spec: &ExpectSpec,
    case_name: &str,
    span: Span,
    src: &SourceArc,
) -> Result<Expectation, SeaQaError> {
    let compile = |pattern: &Option<String>, field: &str| -> Result<Option<Regex>, SeaQaError> {
        pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    err_ctx!(
                        Parse,
                        format!("case '{}' has an invalid `{}` regex", case_name, field),
                        src,
                        span,
                        e
                    )
                })
            })
            .transpose()
    };

    Ok(Expectation {
        exit_code: spec.exit_code,
        stdout: spec.stdout.clone(),
        stdout_contains: spec.stdout_contains.clone(),
        stdout_matches: compile(&spec.stdout_matches, "stdout_matches")?,
        stderr: spec.stderr.clone(),
        stderr_contains: spec.stderr_contains.clone(),
        stderr_matches: compile(&spec.stderr_matches, "stderr_matches")?,
    })
}

fn shell_argv(line: &str) -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string(), line.to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string(), line.to_string()]
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn suite_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "suite".to_string())
}

fn base_dir_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Byte span of the value of the `nth` (zero-based) `name: <name>` entry of a
/// case in `content`. The suite's own top-level `name` key never matches.
fn locate_case_name(content: &str, name: &str, nth: usize) -> Option<Span> {
    let mut line_start = 0;
    let mut found = 0;
    for line in content.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();

        let body = line.trim_start();
        let body = match body.strip_prefix("- ") {
            Some(item) => item.trim_start(),
            None if body.len() == line.len() => continue,
            None => body,
        };
        let Some(value) = body.strip_prefix("name:") else {
            continue;
        };
        let raw = value.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(raw);
        if unquoted != name {
            continue;
        }
        if found == nth {
            let col = line.len() - value.trim_start().len();
            return Some(Span {
                start: start + col,
                end: start + col + raw.len(),
            });
        }
        found += 1;
    }
    None
}
