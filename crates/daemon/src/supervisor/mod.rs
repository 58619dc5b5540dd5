// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Child process supervision.
//!
//! Spawns the executor for a sandbox script with piped stdio and, on
//! Unix, its own process group so the whole tree can be signalled at
//! once. Output streams are handed back to the caller byte-for-byte;
//! only line splitting for classification happens downstream.

mod kill;

pub(crate) use kill::kill_tree;

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// Errors from spawning or driving a sandbox child.
#[derive(Debug, Error)]
pub(crate) enum SupervisorError {
    #[error("failed to spawn executor: {0}")]
    Spawn(std::io::Error),

    #[error("child stdio not captured")]
    Stdio,

    #[error("child stdin not writable: {0}")]
    StdinClosed(std::io::Error),

    #[error("signal delivery failed: {0}")]
    Signal(String),
}

/// Handle to a running sandbox child. Cheap to clone; the stdin sink
/// is shared so command passthrough and the bridge hint can interleave
/// safely.
#[derive(Clone)]
pub(crate) struct ChildHandle {
    pid: u32,
    stdin: Arc<tokio::sync::Mutex<Option<ChildStdin>>>,
}

impl ChildHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Write one line to the child's stdin.
    pub async fn write_line(&self, line: &str) -> Result<(), SupervisorError> {
        let mut guard = self.stdin.lock().await;
        let Some(stdin) = guard.as_mut() else {
            return Err(SupervisorError::StdinClosed(std::io::Error::other("stdin taken")));
        };
        stdin.write_all(line.as_bytes()).await.map_err(SupervisorError::StdinClosed)?;
        stdin.write_all(b"\n").await.map_err(SupervisorError::StdinClosed)?;
        stdin.flush().await.map_err(SupervisorError::StdinClosed)?;
        Ok(())
    }
}

impl std::fmt::Debug for ChildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildHandle").field("pid", &self.pid).finish()
    }
}

/// A freshly spawned child with its streams still attached.
#[derive(Debug)]
pub(crate) struct Spawned {
    pub handle: ChildHandle,
    /// Owned by the exit watcher task.
    pub child: Child,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Launch the executor for a sandbox script.
pub(crate) fn spawn(
    executor: &str,
    script_path: &str,
    env: &HashMap<String, String>,
) -> Result<Spawned, SupervisorError> {
    let mut cmd = Command::new(executor);
    cmd.arg(script_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // New process group so kill_tree can signal the whole tree
    #[cfg(unix)]
    cmd.process_group(0);

    // Untrusted children never see the daemon's own environment.
    // Start minimal (PATH only, for executor resolution) and merge
    // the sandbox config env over it.
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
        cmd.env("PATH", path);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(SupervisorError::Spawn)?;

    let pid = child.id().ok_or(SupervisorError::Stdio)?;
    let stdin = child.stdin.take().ok_or(SupervisorError::Stdio)?;
    let stdout = child.stdout.take().ok_or(SupervisorError::Stdio)?;
    let stderr = child.stderr.take().ok_or(SupervisorError::Stdio)?;

    debug!(pid, executor, script_path, "sandbox child spawned");

    Ok(Spawned {
        handle: ChildHandle { pid, stdin: Arc::new(tokio::sync::Mutex::new(Some(stdin))) },
        child,
        stdout,
        stderr,
    })
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
