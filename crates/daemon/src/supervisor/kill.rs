// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Cross-platform process-tree termination.
//!
//! Unix: signal the process group (children were spawned with
//! `process_group(0)`, so pgid == pid) with SIGTERM, wait out a short
//! grace window, then SIGKILL the group. When group signalling fails
//! for anything other than "already gone", fall back to the root pid.
//!
//! Windows: `taskkill /T /F` enumerates and force-terminates the tree
//! via the OS.
//!
//! Idempotent: a root that is already gone is success.

use std::time::Duration;

use super::SupervisorError;

#[cfg(unix)]
pub(crate) async fn kill_tree(pid: u32, grace: Duration) -> Result<(), SupervisorError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(pid as i32);

    match killpg(pgid, Signal::SIGTERM) {
        Ok(()) => {}
        // Whole group already gone
        Err(Errno::ESRCH) => return Ok(()),
        Err(_) => {
            // Not a group leader (or not ours): signal the root directly
            let root = Pid::from_raw(pid as i32);
            match kill(root, Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => return Err(SupervisorError::Signal(e.to_string())),
            }
            tokio::time::sleep(grace).await;
            match kill(root, Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => return Ok(()),
                Err(e) => return Err(SupervisorError::Signal(e.to_string())),
            }
        }
    }

    tokio::time::sleep(grace).await;

    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(SupervisorError::Signal(e.to_string())),
    }
}

#[cfg(windows)]
pub(crate) async fn kill_tree(pid: u32, _grace: Duration) -> Result<(), SupervisorError> {
    // /T walks the child tree, /F terminates forcefully. A missing
    // process yields a non-zero exit, which counts as success.
    tokio::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .output()
        .await
        .map_err(|e| SupervisorError::Signal(e.to_string()))?;
    Ok(())
}

#[cfg(not(any(unix, windows)))]
pub(crate) async fn kill_tree(pid: u32, _grace: Duration) -> Result<(), SupervisorError> {
    Err(SupervisorError::Signal(format!("unsupported platform (pid={pid})")))
}
