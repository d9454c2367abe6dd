//! Spawns a case invocation and captures what it produces.

use std::{
    io::{Read, Write},
    process::{Child, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, trace};

use crate::{err_msg, report::CapturedOutput, suite::Invocation, SeaQaError};

/// How often a child with a deadline is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// How long to wait for output pipes after killing a timed-out child.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

type Reader = JoinHandle<Vec<u8>>;

/// How a spawned invocation ended.
#[derive(Debug)]
pub enum Execution {
    Completed(CapturedOutput),
    /// The process group was killed at the deadline; output holds whatever arrived.
    TimedOut {
        limit: Duration,
        partial: CapturedOutput,
    },
}

/// Runs `input` to completion or until `timeout` elapses.
///
/// The deadline covers the child and anything it leaves holding its output
/// pipes. On Unix the child leads its own process group, and the whole group
/// is killed when the deadline passes.
///
/// Only failures to start or supervise the process are errors; a non-zero
/// exit is a normal [`Execution::Completed`].
pub fn execute(input: &Invocation, timeout: Option<Duration>) -> Result<Execution, SeaQaError> {
    let mut command = Command::new(&input.program);
    command
        .args(&input.args)
        .envs(&input.env)
        .current_dir(&input.cwd)
        .stdin(if input.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    debug!(command = %input.display_command(), cwd = %input.cwd.display(), "spawning");
    let started = Instant::now();
    let mut child = command.spawn().map_err(|e| {
        err_msg!(
            Execution,
            "failed to spawn '{}' in {}: {}",
            input.program,
            input.cwd.display(),
            e
        )
        .caused_by(e)
    })?;

    if let (Some(pipe), Some(data)) = (child.stdin.take(), input.stdin.clone()) {
        // Detached: it ends once the data is written or the pipe closes.
        spawn_feeder(pipe, data);
    }
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let Some(limit) = timeout else {
        let status = child.wait().map_err(|e| wait_error(input, e))?;
        return Ok(Execution::Completed(collect(stdout, stderr, status.code(), None)));
    };
    let deadline = started + limit;

    let status = wait_until(&mut child, deadline)?;
    let drained = status.is_some()
        && [&stdout, &stderr]
            .into_iter()
            .flatten()
            .all(|reader| finished_by(reader, deadline));

    match status {
        Some(status) if drained => Ok(Execution::Completed(collect(
            stdout,
            stderr,
            status.code(),
            None,
        ))),
        _ => {
            kill_tree(&mut child);
            Ok(Execution::TimedOut {
                limit,
                partial: collect(stdout, stderr, None, Some(DRAIN_GRACE)),
            })
        }
    }
}

/// Polls `child` until it exits or `deadline` passes.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, SeaQaError> {
    loop {
        let polled = child
            .try_wait()
            .map_err(|e| err_msg!(Execution, "failed to poll child process: {}", e).caused_by(e))?;
        if polled.is_some() {
            return Ok(polled);
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the child's process group, then the child itself, and reaps it.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as libc::pid_t;
        // SAFETY: plain syscall; the group is led by our own child, which is
        // not reaped yet or still has live members keeping the id reserved.
        if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
            trace!(error = %std::io::Error::last_os_error(), "process group kill failed");
        }
    }
    if let Err(e) = child.kill() {
        // Already gone between the poll and the kill.
        trace!(error = %e, "kill after deadline failed");
    }
    let _ = child.wait();
}

fn wait_error(input: &Invocation, e: std::io::Error) -> SeaQaError {
    err_msg!(Execution, "failed to wait for '{}': {}", input.program, e).caused_by(e)
}

fn spawn_feeder<W: Write + Send + 'static>(mut pipe: W, data: String) {
    thread::spawn(move || {
        if let Err(e) = pipe.write_all(data.as_bytes()) {
            trace!(error = %e, "stdin closed before all input was written");
        }
    });
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Reader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            trace!(error = %e, "output pipe read failed");
        }
        buf
    })
}

/// True once `reader` has seen end of file, polling no later than `until`.
fn finished_by(reader: &Reader, until: Instant) -> bool {
    loop {
        if reader.is_finished() {
            return true;
        }
        if Instant::now() >= until {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn collect(
    stdout: Option<Reader>,
    stderr: Option<Reader>,
    exit_code: Option<i32>,
    grace: Option<Duration>,
) -> CapturedOutput {
    let until = grace.map(|g| Instant::now() + g);
    let captured = CapturedOutput {
        stdout: drain(stdout, until),
        stderr: drain(stderr, until),
        exit_code,
    };
    trace!(
        stdout_bytes = captured.stdout.len(),
        stderr_bytes = captured.stderr.len(),
        exit_code = ?captured.exit_code,
        "captured"
    );
    captured
}

/// Collects a reader's bytes. With a cutoff, a reader still blocked
/// afterwards (something outside our process group holding the pipe) is
/// abandoned.
fn drain(reader: Option<Reader>, until: Option<Instant>) -> String {
    let Some(handle) = reader else {
        return String::new();
    };
    if let Some(until) = until {
        if !finished_by(&handle, until) {
            return String::new();
        }
    }
    handle
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use std::{collections::BTreeMap, path::PathBuf};

    use super::*;

    fn invocation(program: &str, args: &[&str], stdin: Option<&str>) -> Invocation {
        Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stdin: stdin.map(str::to_string),
            env: BTreeMap::new(),
            cwd: PathBuf::from("."),
        }
    }

    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        let input = invocation("sh", &["-c", "echo out; echo err >&2; exit 3"], None);
        let Execution::Completed(out) = execute(&input, None).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.exit_code, Some(3));
    }

    #[test]
    fn feeds_stdin() {
        let input = invocation("cat", &[], Some("payload\n"));
        let Execution::Completed(out) = execute(&input, Some(Duration::from_secs(5))).unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(out.stdout, "payload\n");
        assert_eq!(out.exit_code, Some(0));
    }

    #[test]
    fn passes_environment() {
        let mut input = invocation("sh", &["-c", "printf %s \"$GREETING\""], None);
        input.env.insert("GREETING".to_string(), "hi there".to_string());
        let Execution::Completed(out) = execute(&input, None).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(out.stdout, "hi there");
    }

    #[test]
    fn kills_at_deadline() {
        let input = invocation("sleep", &["5"], None);
        let started = Instant::now();
        let result = execute(&input, Some(Duration::from_millis(100))).unwrap();
        assert!(matches!(result, Execution::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn background_child_holding_output_cannot_outlive_the_deadline() {
        let input = invocation("sh", &["-c", "sleep 3 & echo hi"], None);
        let started = Instant::now();
        let result = execute(&input, Some(Duration::from_millis(200))).unwrap();
        assert!(matches!(result, Execution::TimedOut { .. }), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn timeout_kills_the_whole_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = invocation("sh", &["-c", "(sleep 1; touch marker) & sleep 5"], None);
        input.cwd = dir.path().to_path_buf();
        let result = execute(&input, Some(Duration::from_millis(200))).unwrap();
        assert!(matches!(result, Execution::TimedOut { .. }));

        thread::sleep(Duration::from_millis(1500));
        assert!(!dir.path().join("marker").exists());
    }

    #[test]
    fn fast_child_with_deadline_completes() {
        let input = invocation("sh", &["-c", "echo done"], None);
        let Execution::Completed(out) = execute(&input, Some(Duration::from_secs(5))).unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(out.stdout, "done\n");
    }

    #[test]
    fn missing_program_is_an_execution_error() {
        let input = invocation("definitely-not-a-real-program-sea-qa", &[], None);
        let err = execute(&input, None).unwrap_err();
        assert_eq!(err.error_kind(), crate::ErrorKind::Execution);
    }
}
