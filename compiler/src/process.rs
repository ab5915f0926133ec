//! Child-process runner used by every backend.
//!
//! Output pipes are drained on helper threads so a chatty child cannot
//! block on a full pipe while we wait for it. The wait itself is bounded
//! by an optional timeout; on expiry the child is killed and reaped.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::CompileError;

/// Number of trailing diagnostic lines kept in [`CompileError::ToolFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Last lines of stderr, or of stdout when stderr is empty.
    pub fn diagnostic_tail(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        tail(source, STDERR_TAIL_LINES)
    }
}

/// Display name of the program a command runs.
pub fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

/// Runs `command` to completion, capturing its output.
///
/// # Errors
///
/// Returns [`CompileError::Spawn`] if the program cannot be started and
/// [`CompileError::Timeout`] if it outlives `timeout`.
pub fn run(command: &mut Command, timeout: Option<Duration>) -> Result<ProcessOutput, CompileError> {
    let program = program_name(command);
    let args: Vec<String> = command
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    debug!(program = %program, args = ?args, "spawning process");

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CompileError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout_thread = child.stdout.take().map(drain);
    let stderr_thread = child.stderr.take().map(drain);

    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit)? {
            Some(status) => status,
            None => {
                debug!(program = %program, timeout_secs = limit.as_secs(), "process timed out, killing");
                let _ = child.kill();
                let _ = child.wait();
                return Err(CompileError::Timeout {
                    program,
                    timeout: limit,
                });
            }
        },
        None => child.wait()?,
    };

    let stdout = collect(stdout_thread, &program, "stdout");
    let stderr = collect(stderr_thread, &program, "stderr");

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

/// Runs `command` and turns a non-zero exit into [`CompileError::ToolFailed`].
pub fn run_checked(
    command: &mut Command,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, CompileError> {
    let output = run(command, timeout)?;
    if output.status.success() {
        return Ok(output);
    }
    Err(CompileError::ToolFailed {
        program: program_name(command),
        code: output.status.code(),
        stderr: output.diagnostic_tail(),
    })
}

type DrainHandle = JoinHandle<(Vec<u8>, std::io::Result<usize>)>;

fn drain<R: Read + Send + 'static>(mut pipe: R) -> DrainHandle {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf);
        (buf, result)
    })
}

fn collect(handle: Option<DrainHandle>, program: &str, stream: &str) -> String {
    handle
        .and_then(|t| t.join().ok())
        .map(|(buf, res)| {
            if let Err(e) = res {
                debug!(program = %program, stream, error = %e, "failed to read output");
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
        .unwrap_or_default()
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last_lines() {
        let text = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let kept = tail(&text, 3);
        assert_eq!(kept, "28\n29\n30");
        assert_eq!(tail("one\n", 5), "one");
    }

    #[test]
    fn test_spawn_failure() {
        let mut cmd = Command::new("restcmd-definitely-not-a-program");
        let err = run(&mut cmd, None).unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);
        let output = run(&mut cmd, Some(Duration::from_secs(10))).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_tool_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_checked(&mut cmd, None).unwrap_err();
        match err {
            CompileError::ToolFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run(&mut cmd, Some(Duration::from_millis(100))).unwrap_err();
        assert!(matches!(err, CompileError::Timeout { .. }));
    }
}
