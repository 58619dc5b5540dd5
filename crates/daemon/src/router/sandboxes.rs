// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Sandbox lifecycle: start, stop, command passthrough, child output.

use std::sync::Arc;

use bh_core::{Clock, PortalId, SandboxId, SandboxKey};
use bh_wire::{ChildMessage, StartConfig, Update};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use crate::listener::ConnRole;
use crate::supervisor::{self, Spawned};

use super::{ConnState, Hub};

/// Which child stream a pumped line came from.
#[derive(Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

impl<C: Clock + 'static> Hub<C> {
    /// `start`: record the sandbox, spawn the executor, deliver the
    /// bridge hint on stdin, then attach and announce.
    pub(crate) async fn start_sandbox(
        self: Arc<Self>,
        state: &mut ConnState,
        config: StartConfig,
        sandbox_id: SandboxId,
    ) {
        let Some(session) = self.ensure_client(state) else {
            return;
        };

        let created = {
            let mut registry = self.registry.lock();
            registry.create_sandbox(
                session,
                sandbox_id,
                config.script_path.clone(),
                config.env.clone(),
                config.target_flutter_bridge_id,
                self.now_ms(),
            )
        };
        let key = match created {
            Ok(key) => key,
            Err(e) => {
                state.conn.send(&Update::error(e.to_string()));
                return;
            }
        };

        let spawned =
            match supervisor::spawn(&self.config.executor, &config.script_path, &config.env) {
                Ok(spawned) => spawned,
                Err(e) => {
                    warn!(sandbox = %key, error = %e, "executor spawn failed");
                    self.registry.lock().remove_sandbox(&key);
                    state.conn.send(&Update::error_with_details(
                        format!("failed to start sandbox: {e}"),
                        json!({ "sandboxId": sandbox_id }),
                    ));
                    return;
                }
            };

        // Out-of-band hint telling the child which portal its
        // interception channel should target.
        let target = {
            let registry = self.registry.lock();
            registry.sandbox(&key).and_then(|entry| entry.sandbox.portal)
        };
        let hint = ChildMessage::BridgeRegister {
            target_flutter_bridge_id: target,
            sandbox_session_id: session,
            actual_sandbox_id: sandbox_id,
        };
        match bh_wire::encode(&hint) {
            Ok(line) => {
                if let Err(e) = spawned.handle.write_line(&line).await {
                    warn!(sandbox = %key, error = %e, "failed to deliver bridge hint");
                }
            }
            Err(e) => warn!(sandbox = %key, error = %e, "failed to encode bridge hint"),
        }

        let sandbox_info = {
            let mut registry = self.registry.lock();
            registry.attach_child(&key, spawned.handle.clone());
            registry.sandbox_info(&key)
        };

        info!(
            session = %session,
            sandbox = %sandbox_id,
            pid = spawned.handle.pid(),
            script = %config.script_path,
            "sandbox started"
        );

        self.broadcast_to_clients(&Update::SandboxUpdated {
            connection_id: session,
            sandbox: sandbox_info,
        });
        self.broadcast_connections();
        if target.is_some() {
            self.broadcast_assignments();
        }

        self.spawn_child_tasks(key, spawned);
    }

    /// `stop`: remove the sandbox and its assignment, kill its process
    /// tree, then announce `isRunning:false`.
    pub(crate) async fn stop_sandbox(&self, state: &mut ConnState, sandbox_id: SandboxId) {
        let Some(session) = self.ensure_client(state) else {
            return;
        };
        let key = SandboxKey::new(session, sandbox_id);

        // Remove first so the exit watcher cannot race the broadcast;
        // the kill still completes before isRunning:false goes out.
        let removed = self.registry.lock().remove_sandbox(&key);
        let Some(entry) = removed else {
            self.reply_unknown_sandbox(state, &sandbox_id);
            return;
        };

        if let Some(child) = &entry.child {
            if let Err(e) = supervisor::kill_tree(child.pid(), self.config.kill_grace).await {
                warn!(sandbox = %key, pid = child.pid(), error = %e, "kill_tree failed");
            }
        }

        info!(session = %session, sandbox = %sandbox_id, "sandbox stopped");

        self.broadcast_to_clients(&Update::SandboxUpdated {
            connection_id: session,
            sandbox: Some(bh_wire::SandboxInfo {
                sandbox_id,
                is_running: false,
                script_path: entry.sandbox.script_path,
                bridge_id: None,
            }),
        });
        self.broadcast_connections();
        self.broadcast_assignments();
    }

    /// `command`: normalize the JSON-RPC request and write it as one
    /// line to the child's stdin.
    pub(crate) async fn send_command(
        &self,
        state: &mut ConnState,
        sandbox_id: SandboxId,
        command: Value,
    ) {
        let Some(session) = self.ensure_client(state) else {
            return;
        };
        let key = SandboxKey::new(session, sandbox_id);

        let (exists, child) = {
            let registry = self.registry.lock();
            (registry.sandbox(&key).is_some(), registry.sandbox_child(&key))
        };
        if !exists {
            self.reply_unknown_sandbox(state, &sandbox_id);
            return;
        }
        let Some(child) = child else {
            state.conn.send(&Update::error_with_details(
                "sandbox is not running",
                json!({ "sandboxId": sandbox_id }),
            ));
            return;
        };

        let normalized = match bh_wire::normalize_command(&command) {
            Ok(value) => value,
            Err(e) => {
                state.conn.send(&Update::error(e.to_string()));
                return;
            }
        };

        if let Err(e) = child.write_line(&normalized.to_string()).await {
            warn!(sandbox = %key, error = %e, "stdin write failed");
            state.conn.send(&Update::error_with_details(
                "sandbox stdin not writable",
                json!({ "sandboxId": sandbox_id }),
            ));
            return;
        }

        state.conn.send(&Update::CommandSent {
            connection_id: session,
            sandbox_id,
            command: normalized,
        });
    }

    /// `get_bridge_status`: direct snapshot reply.
    pub(crate) fn get_bridge_status(&self, state: &mut ConnState) {
        if self.ensure_client(state).is_none() {
            return;
        }
        let bridges = self.registry.lock().bridge_status();
        state.conn.send(&Update::BridgeStatusUpdate { bridges });
    }

    /// `get_connected_sandboxes`: sandboxes assigned to one portal.
    pub(crate) fn get_connected_sandboxes(&self, state: &mut ConnState, bridge_id: PortalId) {
        if self.ensure_client(state).is_none() {
            return;
        }
        let sandboxes = self.registry.lock().connected_to_portal(&bridge_id);
        state.conn.send(&Update::ConnectedSandboxesUpdate { sandboxes });
    }

    fn reply_unknown_sandbox(&self, state: &ConnState, sandbox_id: &SandboxId) {
        let available = match &state.role {
            ConnRole::Client { session } => self.registry.lock().session_sandbox_ids(session),
            _ => Vec::new(),
        };
        state.conn.send(&Update::error_with_details(
            format!("no such sandbox: {sandbox_id}"),
            json!({ "availableSandboxes": available }),
        ));
    }

    /// Wire the child's stdio into the hub: one pump per output
    /// stream, plus an exit watcher that reaps the sandbox.
    fn spawn_child_tasks(self: Arc<Self>, key: SandboxKey, spawned: Spawned) {
        let Spawned { handle, mut child, stdout, stderr } = spawned;
        let pid = handle.pid();

        Arc::clone(&self).spawn_output_pump(key, stdout, OutputStream::Stdout);
        Arc::clone(&self).spawn_output_pump(key, stderr, OutputStream::Stderr);

        let hub = self;
        tokio::spawn(async move {
            let status = child.wait().await;
            match &status {
                Ok(status) => info!(sandbox = %key, pid, %status, "sandbox child exited"),
                Err(e) => warn!(sandbox = %key, pid, error = %e, "wait on sandbox child failed"),
            }

            let removed = {
                let mut registry = hub.registry.lock();
                let current = registry
                    .sandbox(&key)
                    .and_then(|entry| entry.child.as_ref())
                    .map(|child| child.pid());
                // Only reap our own child; a stop may already have
                // removed the sandbox, or a later start reused the key.
                if current == Some(pid) {
                    registry.remove_sandbox(&key).is_some()
                } else {
                    false
                }
            };

            if removed {
                hub.broadcast_to_clients(&Update::SandboxUpdated {
                    connection_id: key.session,
                    sandbox: None,
                });
                hub.broadcast_connections();
                hub.broadcast_assignments();
            }
        });
    }

    fn spawn_output_pump(
        self: Arc<Self>,
        key: SandboxKey,
        stream: impl AsyncRead + Unpin + Send + 'static,
        which: OutputStream,
    ) {
        let hub = self;
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let is_json = bh_wire::is_jsonrpc_response(&line);
                let Some(conn) = hub.registry.lock().session_conn(&key.session) else {
                    debug!(sandbox = %key, "owning session gone, dropping child output");
                    break;
                };
                let msg = match which {
                    OutputStream::Stdout => Update::Stdout {
                        connection_id: key.session,
                        sandbox_id: key.sandbox,
                        message: line,
                        is_json,
                    },
                    OutputStream::Stderr => Update::Stderr {
                        connection_id: key.session,
                        sandbox_id: key.sandbox,
                        message: line,
                        is_json,
                    },
                };
                conn.send(&msg);
            }
        });
    }
}
