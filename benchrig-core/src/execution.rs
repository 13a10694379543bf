//! Measured child-process execution.
//!
//! The shared spawn/wait engine every memory probe builds on: spawns the
//! command, starts wall-clock timing, drains stderr on a helper thread so a
//! chatty child cannot fill the pipe and deadlock the wait loop, and
//! optionally invokes a sampling callback between liveness polls.
//!
//! A nonzero exit is a normal, reportable outcome here, never an `Err`.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// A command to execute and measure: program plus its arguments.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Program to invoke.
    pub program: PathBuf,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl ExecRequest {
    /// A request with no arguments (the run phase invokes artifacts bare).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// A request with arguments.
    pub fn with_args(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// What one measured execution produced.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Wall-clock time from spawn to termination.
    pub elapsed: Duration,
    /// Peak resident memory attributed to the execution, in bytes.
    pub peak_memory_bytes: u64,
    /// Child exit code; signal deaths map to `128 + signo`.
    pub exit_code: i32,
    /// Captured stderr, retained only when the child exited nonzero.
    pub stderr: Option<String>,
}

impl ExecOutcome {
    pub(crate) fn from_waited(waited: WaitedChild, peak_memory_bytes: u64) -> Self {
        let WaitedChild {
            elapsed,
            exit_code,
            stderr,
        } = waited;
        Self {
            elapsed,
            peak_memory_bytes,
            exit_code,
            stderr: (exit_code != 0).then(|| stderr.trim_end().to_string()),
        }
    }
}

/// Raw spawn/wait result before a probe attaches its memory figure.
pub(crate) struct WaitedChild {
    pub elapsed: Duration,
    pub exit_code: i32,
    pub stderr: String,
}

/// Spawn `request` and wait for completion.
///
/// With `interval` set, the child is polled via `try_wait` and `on_tick(pid)`
/// fires between polls (the polling probe samples there). Without it, the
/// wait is a plain blocking `wait`. Stdout is discarded; stderr is captured.
pub(crate) fn spawn_and_wait(
    request: &ExecRequest,
    interval: Option<Duration>,
    mut on_tick: impl FnMut(u32),
) -> io::Result<WaitedChild> {
    let mut command = Command::new(&request.program);
    command
        .args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = command.spawn()?;
    let pid = child.id();

    let stderr_pipe = child.stderr.take();
    let drain = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let status = match interval {
        Some(interval) => loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    on_tick(pid);
                    thread::sleep(interval);
                }
            }
        },
        None => child.wait()?,
    };
    let elapsed = start.elapsed();
    let stderr = drain.join().unwrap_or_default();

    Ok(WaitedChild {
        elapsed,
        exit_code: exit_code_of(status),
        stderr,
    })
}

/// Exit code of a terminated child, mapping signal deaths to `128 + signo`
/// the way shells do.
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signo| 128 + signo))
        .unwrap_or(-1)
}
