//! Spawning one command under a wall-clock limit.
//!
//! Every child leads its own process group. The group is killed when the
//! child exits, when the timeout fires, and when the call is abandoned
//! mid-flight (its future dropped), so nothing the program forked outlives
//! the call.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use language::CommandLine;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ExecError, ExecResult};
use crate::process::{exit_code, kill_process_group};

/// How long output readers may keep draining once the process group is gone.
/// Only a process that left the group (e.g. via `setsid`) can hold a pipe
/// open past this point.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Kills the process group if `run_process` is dropped before it reached
/// its own teardown.
struct GroupGuard(Option<u32>);

impl GroupGuard {
    fn kill_now(&mut self) {
        if let Some(pid) = self.0.take() {
            kill_process_group(pid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.0 {
            debug!(pid, "run abandoned, killing process group");
        }
        self.kill_now();
    }
}

/// Bytes captured from a child's stdout and stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Exited { exit_code: i32, output: ProcessOutput },
    /// The timeout fired and the whole process group was killed.
    TimedOut { output: ProcessOutput },
}

impl RunOutcome {
    pub fn output(&self) -> &ProcessOutput {
        match self {
            Self::Exited { output, .. } | Self::TimedOut { output } => output,
        }
    }
}

/// Run `command` in `working_dir` with a wall-clock limit.
///
/// The child leads its own process group with stdin closed. When it exits,
/// or when `timeout` elapses, the whole group is sent `SIGKILL`, so
/// neither a runaway program nor anything it forked outlives the call.
pub async fn run_process(
    command: &CommandLine,
    working_dir: &Path,
    timeout: Duration,
) -> ExecResult<RunOutcome> {
    let started = Instant::now();
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            command: command.to_string(),
            source,
        })?;

    // `id()` returns None once the child has been reaped.
    let pid = child.id();
    let mut group = GroupGuard(pid);
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    debug!(
        pid,
        command = %command,
        timeout_ms = timeout.as_millis() as u64,
        "process spawned"
    );

    let waited = tokio::time::timeout(timeout, child.wait()).await;

    // Also after a normal exit: background jobs would keep the pipes open.
    group.kill_now();

    let status = match waited {
        Ok(Ok(status)) => Some(status),
        Ok(Err(source)) => {
            return Err(ExecError::Wait {
                command: command.to_string(),
                source,
            });
        }
        Err(_) => {
            if let Err(e) = child.wait().await {
                warn!(pid, error = %e, "failed to reap timed out process");
            }
            None
        }
    };

    let output = ProcessOutput {
        stdout: collect(stdout).await,
        stderr: collect(stderr).await,
        elapsed: started.elapsed(),
    };

    Ok(match status {
        Some(status) => {
            let exit_code = exit_code(status);
            debug!(pid, exit_code, elapsed_ms = output.elapsed.as_millis() as u64, "process exited");
            RunOutcome::Exited { exit_code, output }
        }
        None => {
            warn!(
                pid,
                command = %command,
                timeout_ms = timeout.as_millis() as u64,
                "process timed out, process group killed"
            );
            RunOutcome::TimedOut { output }
        }
    })
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pipe.map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!(error = %e, "output pipe read failed");
            }
            buf
        })
    })
}

async fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    let Some(reader) = reader else {
        return Vec::new();
    };
    match tokio::time::timeout(DRAIN_TIMEOUT, reader).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            warn!(error = %e, "output reader task failed");
            Vec::new()
        }
        Err(_) => {
            warn!("output pipe still open after process group kill, discarding");
            Vec::new()
        }
    }
}
