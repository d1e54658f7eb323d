use std::process::ExitStatus;

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::warn;

/// Kill the entire process group led by `pid` via `killpg(SIGKILL)`.
///
/// Requires the leader to have been spawned with `process_group(0)` so that
/// its PGID equals its PID. Returns `true` if a signal was delivered; a group
/// that no longer exists is not an error.
pub(crate) fn kill_process_group(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            warn!(pgid = pid, error = %e, "killpg failed");
            false
        }
    }
}

/// Exit code of a finished process; death by signal maps to `128 + signal`.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .unwrap_or_else(|| status.signal().map(|sig| 128 + sig).unwrap_or(1))
}
