//! Process-tree termination with SIGTERM → SIGKILL escalation.
//!
//! Supervised services are spawned into their own process group, so a
//! script that forks further children is stopped as a whole by
//! signalling the group rather than just the direct child.

use std::io;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::sleep;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::sys::wait::{Id, WaitPidFlag, WaitStatus, waitid};
#[cfg(unix)]
use nix::unistd::Pid;

/// Terminate the process group rooted at `pid`.
///
/// # Strategy
/// 1. SIGTERM the group and poll up to 5 seconds for exit
/// 2. If the root is still alive, SIGKILL the group
/// 3. Poll again for up to 2 seconds
///
/// A group that is already gone (`ESRCH`) succeeds silently at every
/// phase; stopping something that already exited is not an error.
pub async fn terminate_tree(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        terminate_tree_unix(pid).await
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process-group termination is not implemented on this platform",
        ))
    }
}

#[cfg(unix)]
async fn terminate_tree_unix(pid: u32) -> io::Result<()> {
    let group = Pid::from_raw(pid as i32);

    // Phase 1: graceful signal to the whole group.
    if let Err(e) = signal::killpg(group, Signal::SIGTERM) {
        if e == Errno::ESRCH {
            return Ok(());
        }
        return Err(io::Error::other(e));
    }

    if wait_for_exit(group, 50).await {
        return Ok(());
    }

    // Phase 2: forceful fallback.
    if let Err(e) = signal::killpg(group, Signal::SIGKILL) {
        if e == Errno::ESRCH {
            return Ok(());
        }
        return Err(io::Error::other(e));
    }

    if wait_for_exit(group, 20).await {
        return Ok(());
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process group {pid} did not exit after SIGKILL"),
    ))
}

/// Poll until the group root has exited.
#[cfg(unix)]
async fn wait_for_exit(pid: Pid, polls: u32) -> bool {
    for _ in 0..polls {
        sleep(Duration::from_millis(100)).await;
        if root_exited(pid) {
            return true;
        }
    }
    false
}

/// Whether the group root is gone for shutdown purposes: either no such
/// process, or it has exited and lingers only as an unreaped zombie.
///
/// The null-signal probe alone is not enough here: a zombie still
/// answers `kill(pid, 0)` with success, so a caller that reaps only
/// after termination returns would otherwise spin until the deadline.
/// `WNOWAIT` peeks at the exit status without consuming it, leaving the
/// reap to whoever owns the child.
#[cfg(unix)]
fn root_exited(pid: Pid) -> bool {
    match waitid(
        Id::Pid(pid),
        WaitPidFlag::WEXITED | WaitPidFlag::WNOHANG | WaitPidFlag::WNOWAIT,
    ) {
        Ok(WaitStatus::StillAlive) => false,
        Ok(_) => true,
        // Not our child, or already reaped: fall back to existence.
        Err(_) => matches!(signal::kill(pid, None), Err(Errno::ESRCH)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_handles_already_gone() {
        // A PID this high is vanishingly unlikely to exist.
        assert!(terminate_tree(999_999).await.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_kills_a_spawned_group() {
        use std::process::Stdio;
        use tokio::process::Command;

        let mut cmd = Command::new("sleep");
        cmd.arg("60").stdout(Stdio::null()).process_group(0);
        let mut child = cmd.spawn().expect("failed to spawn sleep");
        let pid = child.id().expect("no PID");

        terminate_tree(pid).await.expect("terminate failed");

        // Reap; the child must be gone.
        let status = child.wait().await.expect("wait failed");
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn unreaped_exit_counts_as_terminated() {
        use std::process::Stdio;
        use tokio::process::Command;

        let mut cmd = Command::new("true");
        cmd.stdout(Stdio::null()).process_group(0);
        let mut child = cmd.spawn().expect("failed to spawn");
        let pid = child.id().expect("no PID");

        // Let it exit; nobody has reaped it yet, so it lingers as a
        // zombie that still answers the null signal.
        sleep(Duration::from_millis(200)).await;

        terminate_tree(pid).await.expect("zombie not seen as exited");

        // The exit status must still be available to the owner.
        let status = child.wait().await.expect("wait failed");
        assert!(status.success());
    }
}
