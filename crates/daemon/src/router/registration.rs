// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Token issuance and the three registration paths.

use std::sync::Arc;

use bh_core::{BridgeClient, Clock, InstanceId, Portal, PortalId, SandboxId, SessionId};
use bh_wire::Update;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::listener::ConnRole;

use super::{ConnState, Hub};

impl<C: Clock + 'static> Hub<C> {
    /// `generate_bridge_id`: mint an admission token and arm its
    /// expiry task.
    pub(crate) fn generate_bridge_id(self: Arc<Self>, state: &mut ConnState, request_id: String) {
        let Some(_session) = self.ensure_client(state) else {
            return;
        };

        let ttl = self.config.token_ttl;
        let (token, expiry) = {
            let mut registry = self.registry.lock();
            registry.mint_token(self.now_ms(), ttl.as_millis() as u64)
        };

        let hub = Arc::clone(&self);
        let token_id = token.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = expiry.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    let expired = hub.registry.lock().expire_token(&token_id);
                    if expired {
                        debug!(bridge_id = %token_id, "admission token expired");
                        hub.broadcast_validation();
                    }
                }
            }
        });

        info!(bridge_id = %token.id, expires_at = token.expires_at, "admission token minted");
        state.conn.send(&Update::BridgeIdGenerated {
            bridge_id: token.id,
            expires_at: token.expires_at,
            request_id,
        });
        self.broadcast_validation();
    }

    /// `bridge_register` from a portal: consume the token, register,
    /// adopt orphaned sandboxes. An invalid or expired token closes
    /// the connection.
    pub(crate) fn register_portal(
        &self,
        state: &mut ConnState,
        bridge_id: PortalId,
        platform: Option<String>,
        capabilities: Option<Value>,
    ) {
        if state.role != ConnRole::Unclassified {
            state.conn.send(&Update::error(format!(
                "connection already classified as {}",
                state.role.name()
            )));
            return;
        }

        let registered = {
            let mut registry = self.registry.lock();
            if !registry.consume_token(&bridge_id, self.now_ms()) {
                None
            } else {
                let mut portal = Portal::new(bridge_id, platform, self.now_ms());
                portal.capabilities = capabilities;
                match registry.register_portal(portal, state.conn.clone()) {
                    Ok(()) => Some(registry.assign_orphans(bridge_id)),
                    Err(e) => {
                        warn!(bridge_id = %bridge_id, error = %e, "portal registration rejected");
                        None
                    }
                }
            }
        };

        let Some(adopted) = registered else {
            warn!(conn = %state.conn.id(), bridge_id = %bridge_id, "invalid or expired bridge id");
            state.conn.send(&Update::error("invalid or expired bridge id"));
            state.conn.close();
            return;
        };

        state.role = ConnRole::Portal { portal: bridge_id };
        info!(
            conn = %state.conn.id(),
            bridge_id = %bridge_id,
            adopted = adopted.len(),
            "portal registered"
        );

        state.conn.send(&Update::BridgeRegistered { bridge_id });
        self.broadcast_bridge_status();
        self.broadcast_validation();
        self.broadcast_assignments();
    }

    /// `bridge_register` from a sandbox-bridge-client: the channel a
    /// spawned child opens back to the hub.
    pub(crate) fn register_bridge_client(
        &self,
        state: &mut ConnState,
        bridge_id: PortalId,
        sandbox_session_id: Option<SessionId>,
        actual_sandbox_id: Option<SandboxId>,
        instance_id: Option<InstanceId>,
    ) {
        if state.role != ConnRole::Unclassified {
            state.conn.send(&Update::error(format!(
                "connection already classified as {}",
                state.role.name()
            )));
            return;
        }
        let (Some(session), Some(sandbox)) = (sandbox_session_id, actual_sandbox_id) else {
            state.conn.send(&Update::error(
                "bridge_register requires sandboxSessionId and actualSandboxId",
            ));
            return;
        };
        let instance = instance_id
            .unwrap_or_else(|| InstanceId::from_string(uuid::Uuid::new_v4().to_string()));

        let result = {
            let mut registry = self.registry.lock();
            registry.register_bridge(
                BridgeClient { instance, session, sandbox, portal: bridge_id },
                state.conn.clone(),
            )
        };

        if let Err(e) = result {
            state.conn.send(&Update::error(e.to_string()));
            return;
        }

        state.role = ConnRole::Bridge { instance };
        info!(
            conn = %state.conn.id(),
            instance = %instance,
            session = %session,
            sandbox = %sandbox,
            bridge_id = %bridge_id,
            "sandbox bridge client registered"
        );
        state.conn.send(&Update::BridgeRegistered { bridge_id });
    }

    /// `bridge_capabilities_report`: only the owning portal may update
    /// its own record.
    pub(crate) fn capabilities_report(
        &self,
        state: &mut ConnState,
        bridge_id: PortalId,
        capabilities: Value,
    ) {
        match &state.role {
            ConnRole::Portal { portal } if *portal == bridge_id => {
                let stored = self.registry.lock().set_capabilities(&bridge_id, capabilities);
                if stored {
                    self.broadcast_bridge_status();
                }
            }
            _ => {
                state.conn.send(&Update::error("capabilities report from non-owning connection"));
            }
        }
    }
}
