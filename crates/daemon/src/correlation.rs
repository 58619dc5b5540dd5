// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Correlation table for in-flight forwarded effects.
//!
//! Every effect the hub forwards to a portal gets a fresh forwarded-id
//! and a pending entry remembering who asked. The entry resolves
//! exactly once: by the portal's reply, by the deadline timer, or by a
//! peer disconnect draining it. Map removal is the linearization
//! point, so a reply racing its own timeout is a no-op for the loser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bh_core::PortalId;
use bh_wire::{BridgeReply, EffectKind, Update};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::listener::{ConnHandle, ConnId};

/// A forwarded effect awaiting its portal reply.
pub(crate) struct Pending {
    /// The sandbox-bridge-client that sent the effect.
    pub origin: ConnHandle,
    /// The sandbox-local request id to echo back.
    pub request_id: String,
    /// Effect type, for logging.
    pub kind: EffectKind,
    /// Portal the effect was routed to.
    pub portal: PortalId,
    timer: CancellationToken,
}

#[derive(Clone, Default)]
pub(crate) struct CorrelationTable {
    inner: Arc<Mutex<HashMap<String, Pending>>>,
    seq: Arc<AtomicU64>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh forwarded-id.
    pub fn next_id(&self) -> String {
        format!("F-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Insert a pending entry and arm its deadline timer. When the
    /// deadline fires first, the origin receives a synthetic timeout
    /// `bridge_response`.
    pub fn register(
        &self,
        forwarded_id: String,
        origin: ConnHandle,
        request_id: String,
        kind: EffectKind,
        portal: PortalId,
        deadline: Duration,
    ) {
        let timer = CancellationToken::new();
        let entry = Pending {
            origin,
            request_id,
            kind,
            portal,
            timer: timer.clone(),
        };
        self.inner.lock().insert(forwarded_id.clone(), entry);

        let table = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    if let Some(pending) = table.complete(&forwarded_id) {
                        warn!(
                            forwarded_id = %forwarded_id,
                            effect = %pending.kind,
                            portal = %pending.portal,
                            "forwarded effect timed out"
                        );
                        pending.origin.send(&Update::BridgeResponse {
                            request_id: pending.request_id,
                            response: BridgeReply::error("timeout"),
                        });
                    }
                }
            }
        });
    }

    /// Remove and return the entry for a forwarded-id, disarming its
    /// timer. Returns `None` when the entry already resolved.
    pub fn complete(&self, forwarded_id: &str) -> Option<Pending> {
        let pending = self.inner.lock().remove(forwarded_id)?;
        pending.timer.cancel();
        Some(pending)
    }

    /// Remove every entry routed to the given portal.
    pub fn drain_portal(&self, portal: &PortalId) -> Vec<Pending> {
        self.drain_where(|p| p.portal == *portal)
    }

    /// Remove every entry owned by the given origin connection.
    /// The portal's eventual replies will be dropped silently.
    pub fn drain_origin(&self, origin: ConnId) -> usize {
        let drained = self.drain_where(|p| p.origin.id() == origin);
        if !drained.is_empty() {
            debug!(conn = %origin, count = drained.len(), "cancelled pending forwards");
        }
        drained.len()
    }

    fn drain_where(&self, mut matches: impl FnMut(&Pending) -> bool) -> Vec<Pending> {
        let mut map = self.inner.lock();
        let keys: Vec<String> =
            map.iter().filter(|(_, p)| matches(p)).map(|(k, _)| k.clone()).collect();
        let mut drained = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(pending) = map.remove(&key) {
                pending.timer.cancel();
                drained.push(pending);
            }
        }
        drained
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
