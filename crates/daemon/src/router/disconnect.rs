// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Disconnect handling for every role.

use bh_core::Clock;
use bh_wire::{BridgeReply, Update};
use tracing::{debug, info, warn};

use crate::listener::ConnRole;
use crate::supervisor;

use super::{ConnState, Hub};

impl<C: Clock + 'static> Hub<C> {
    /// Handle a closed connection according to its settled role.
    pub(crate) async fn handle_disconnect(&self, state: ConnState) {
        match state.role {
            ConnRole::Unclassified => {
                debug!(conn = %state.conn.id(), "unclassified connection closed");
            }

            // A client takes its sandboxes with it: kill every tree,
            // drop the sandboxes and assignments, then the session.
            ConnRole::Client { session } => {
                info!(conn = %state.conn.id(), session = %session, "client disconnected");

                // Remove everything first so exit watchers cannot race
                // the broadcasts, then kill the trees.
                let victims: Vec<_> = {
                    let mut registry = self.registry.lock();
                    let keys = registry.session_sandboxes(&session);
                    let entries: Vec<_> = keys
                        .iter()
                        .filter_map(|key| {
                            registry
                                .remove_sandbox(key)
                                .and_then(|entry| entry.child.map(|child| (*key, child.pid())))
                        })
                        .collect();
                    registry.remove_session(&session);
                    entries
                };

                for (key, pid) in &victims {
                    if let Err(e) = supervisor::kill_tree(*pid, self.config.kill_grace).await {
                        warn!(sandbox = %key, pid, error = %e, "kill_tree failed");
                    }
                }

                self.broadcast_connections();
                self.broadcast_assignments();
            }

            // Sandboxes assigned to a dead portal keep their sticky
            // assignment; in-flight forwards fail fast.
            ConnRole::Portal { portal } => {
                info!(conn = %state.conn.id(), bridge_id = %portal, "portal disconnected");

                self.registry.lock().remove_portal(&portal);

                for pending in self.pending.drain_portal(&portal) {
                    pending.origin.send(&Update::BridgeResponse {
                        request_id: pending.request_id,
                        response: BridgeReply::error("peer disconnected"),
                    });
                }

                self.broadcast_bridge_status();
            }

            // The sandbox child itself is unaffected; only its pending
            // correlations die, and later portal replies are dropped.
            ConnRole::Bridge { instance } => {
                debug!(conn = %state.conn.id(), instance = %instance, "bridge client disconnected");
                self.registry.lock().remove_bridge(&instance);
                self.pending.drain_origin(state.conn.id());
            }
        }
    }
}
