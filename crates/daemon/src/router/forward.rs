// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Intercepted-call forwarding and the portal reply path.

use std::sync::Arc;

use bh_core::Clock;
use bh_wire::{BridgeReply, EffectKind, ForwardEnvelope, PortalForward, RoutingInfo, Update};
use tracing::{debug, warn};

use crate::listener::ConnRole;

use super::{ConnState, Hub};

impl<C: Clock + 'static> Hub<C> {
    /// Forward one intercepted effect to its target portal, minting a
    /// forwarded-id and remembering the waiting caller.
    pub(crate) fn forward_effect(
        &self,
        state: &mut ConnState,
        kind: EffectKind,
        envelope: ForwardEnvelope,
    ) {
        if !matches!(state.role, ConnRole::Bridge { .. }) {
            state.conn.send(&Update::error(format!(
                "{kind} is only accepted from a sandbox bridge client"
            )));
            return;
        }

        let portal_conn = self.registry.lock().portal_conn(&envelope.target_flutter_bridge_id);
        let Some(portal_conn) = portal_conn else {
            debug!(
                bridge_id = %envelope.target_flutter_bridge_id,
                effect = %kind,
                "target portal unavailable"
            );
            state.conn.send(&Update::BridgeResponse {
                request_id: envelope.request_id,
                response: BridgeReply::error("portal unavailable"),
            });
            return;
        };

        let forwarded_id = self.pending.next_id();
        self.pending.register(
            forwarded_id.clone(),
            state.conn.clone(),
            envelope.request_id.clone(),
            kind,
            envelope.target_flutter_bridge_id,
            self.config.forward_timeout,
        );

        debug!(
            forwarded_id = %forwarded_id,
            effect = %kind,
            sandbox = %envelope.actual_sandbox_id,
            bridge_id = %envelope.target_flutter_bridge_id,
            "forwarding effect"
        );

        portal_conn.send(&PortalForward {
            kind,
            request_id: forwarded_id,
            payload: envelope.payload,
            routing_info: RoutingInfo {
                target_flutter_bridge_id: envelope.target_flutter_bridge_id,
                sandbox_session_id: envelope.sandbox_session_id,
                actual_sandbox_id: envelope.actual_sandbox_id,
            },
        });
    }

    /// `bridge_response_from_portal`: route the reply back to the
    /// exact waiting caller. A reply whose correlation already
    /// resolved (timeout, peer gone) is dropped.
    pub(crate) fn portal_reply(
        &self,
        state: &mut ConnState,
        request_id: String,
        response: BridgeReply,
    ) {
        if !matches!(state.role, ConnRole::Portal { .. }) {
            state.conn.send(&Update::error(
                "bridge_response_from_portal is only accepted from a portal",
            ));
            return;
        }

        match self.pending.complete(&request_id) {
            Some(pending) => {
                pending.origin.send(&Update::BridgeResponse {
                    request_id: pending.request_id,
                    response,
                });
            }
            None => {
                debug!(forwarded_id = %request_id, "reply for resolved correlation, dropping");
            }
        }
    }
}
