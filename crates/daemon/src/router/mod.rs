// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Protocol state machine.
//!
//! Every inbound message is dispatched here, parameterized by the
//! connection's role. The hub owns the registry (one lock) and the
//! correlation table; handlers snapshot state, mutate atomically, and
//! release before any suspension point.

mod disconnect;
mod forward;
mod registration;
mod sandboxes;

use std::sync::Arc;

use bh_core::{Clock, SessionId};
use bh_wire::{RegisterOrigin, Request, Update};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::correlation::CorrelationTable;
use crate::lifecycle::Config;
use crate::listener::{ConnHandle, ConnRole};
use crate::registry::Registry;

/// Per-connection dispatch state, owned by the connection's read task.
pub(crate) struct ConnState {
    pub conn: ConnHandle,
    pub role: ConnRole,
}

impl ConnState {
    pub fn new(conn: ConnHandle) -> Self {
        Self { conn, role: ConnRole::Unclassified }
    }
}

/// Shared hub context for all connection tasks.
pub(crate) struct Hub<C: Clock> {
    pub registry: Mutex<Registry>,
    pub pending: CorrelationTable,
    pub clock: C,
    pub config: Config,
}

impl<C: Clock + 'static> Hub<C> {
    pub fn new(config: Config, clock: C) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            pending: CorrelationTable::new(),
            clock,
            config,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Dispatch one inbound message.
    pub async fn dispatch(self: Arc<Self>, state: &mut ConnState, req: Request) {
        debug!(conn = %state.conn.id(), role = state.role.name(), msg = ?req, "dispatch");

        // A client action from an unclassified connection settles its
        // role and opens a session before the handler runs.
        if state.role == ConnRole::Unclassified && req.classifies_client() {
            self.open_client_session(state);
        }

        match req {
            Request::Ping => state.conn.send(&Update::Pong),

            Request::GenerateBridgeId { request_id } => {
                self.generate_bridge_id(state, request_id);
            }

            Request::BridgeRegister {
                origin: RegisterOrigin::FlutterBridgePortal,
                bridge_id,
                platform,
                capabilities,
                ..
            } => self.register_portal(state, bridge_id, platform, capabilities),

            Request::BridgeRegister {
                origin: RegisterOrigin::SandboxBridgeClient,
                bridge_id,
                sandbox_session_id,
                actual_sandbox_id,
                instance_id,
                ..
            } => self.register_bridge_client(
                state,
                bridge_id,
                sandbox_session_id,
                actual_sandbox_id,
                instance_id,
            ),

            Request::BridgeCapabilitiesReport { bridge_id, capabilities } => {
                self.capabilities_report(state, bridge_id, capabilities);
            }

            Request::Start { config, sandbox_id } => {
                self.start_sandbox(state, config, sandbox_id).await;
            }

            Request::Stop { sandbox_id } => self.stop_sandbox(state, sandbox_id).await,

            Request::Command { sandbox_id, command } => {
                self.send_command(state, sandbox_id, command).await;
            }

            Request::GetBridgeStatus => self.get_bridge_status(state),

            Request::GetConnectedSandboxes { bridge_id } => {
                self.get_connected_sandboxes(state, bridge_id);
            }

            Request::BridgeResponseFromPortal { request_id, response } => {
                self.portal_reply(state, request_id, response);
            }

            other => {
                if let Some((kind, envelope)) = other.effect() {
                    let envelope = envelope.clone();
                    self.forward_effect(state, kind, envelope);
                }
            }
        }
    }

    /// Classify an unclassified connection as a client: open a session
    /// and bring the new client up to date with state snapshots.
    fn open_client_session(&self, state: &mut ConnState) {
        let (session, bridges, valid, assignments, connections) = {
            let mut registry = self.registry.lock();
            let session = registry.open_session(state.conn.clone(), self.now_ms());
            (
                session,
                registry.bridge_status(),
                registry.live_token_ids(),
                registry.assignments(),
                registry.connections(),
            )
        };
        state.role = ConnRole::Client { session };
        info!(conn = %state.conn.id(), session = %session, "client session opened");

        state.conn.send(&Update::BridgeStatusUpdate { bridges });
        state.conn.send(&Update::BridgeValidationUpdate { valid_bridge_ids: valid });
        state.conn.send(&Update::BridgeAssignmentsUpdate { assignments });
        state.conn.send(&Update::ConnectionsUpdate { connections });
    }

    /// Resolve the session of a classified client connection. Any
    /// other role gets a protocol error; dispatch has already
    /// classified unregistered connections sending client actions.
    pub(crate) fn ensure_client(&self, state: &mut ConnState) -> Option<SessionId> {
        match &state.role {
            ConnRole::Client { session } => Some(*session),
            other => {
                state.conn.send(&Update::error(format!(
                    "not a client connection (role: {})",
                    other.name()
                )));
                None
            }
        }
    }

    // --- broadcasts ---
    //
    // Snapshot under the lock, send after release. Sends are
    // non-blocking (bounded queue), so the last broadcast after a state
    // change always reflects that state even when earlier ones coalesce.

    pub(crate) fn broadcast_to_clients<T: Serialize>(&self, msg: &T) {
        let conns = self.registry.lock().client_conns();
        for conn in conns {
            conn.send(msg);
        }
    }

    pub(crate) fn broadcast_bridge_status(&self) {
        let (conns, bridges) = {
            let registry = self.registry.lock();
            (registry.client_conns(), registry.bridge_status())
        };
        let msg = Update::BridgeStatusUpdate { bridges };
        for conn in conns {
            conn.send(&msg);
        }
    }

    pub(crate) fn broadcast_validation(&self) {
        let (conns, valid) = {
            let registry = self.registry.lock();
            (registry.client_conns(), registry.live_token_ids())
        };
        let msg = Update::BridgeValidationUpdate { valid_bridge_ids: valid };
        for conn in conns {
            conn.send(&msg);
        }
    }

    pub(crate) fn broadcast_assignments(&self) {
        let (conns, assignments) = {
            let registry = self.registry.lock();
            (registry.client_conns(), registry.assignments())
        };
        let msg = Update::BridgeAssignmentsUpdate { assignments };
        for conn in conns {
            conn.send(&msg);
        }
    }

    pub(crate) fn broadcast_connections(&self) {
        let (conns, connections) = {
            let registry = self.registry.lock();
            (registry.client_conns(), registry.connections())
        };
        let msg = Update::ConnectionsUpdate { connections };
        for conn in conns {
            conn.send(&msg);
        }
    }
}


#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
