// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Per-connection handles and role tags.

use std::sync::atomic::{AtomicU64, Ordering};

use bh_core::{InstanceId, PortalId, SessionId};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Utf8Bytes;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::warn;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ConnId(u64);

impl ConnId {
    fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Role a connection settles into on first registration. Set once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConnRole {
    Unclassified,
    Client { session: SessionId },
    Portal { portal: PortalId },
    Bridge { instance: InstanceId },
}

impl ConnRole {
    pub fn name(&self) -> &'static str {
        match self {
            ConnRole::Unclassified => "unclassified",
            ConnRole::Client { .. } => "client",
            ConnRole::Portal { .. } => "portal",
            ConnRole::Bridge { .. } => "sandbox-bridge-client",
        }
    }
}

/// Sending half of a peer connection.
///
/// Frames are queued on a bounded channel drained by the connection's
/// writer task; messages to a single peer keep their enqueue order. A
/// peer that stops draining overflows the queue and is terminated
/// rather than allowed to stall the hub.
#[derive(Clone)]
pub(crate) struct ConnHandle {
    id: ConnId,
    tx: mpsc::Sender<Utf8Bytes>,
    closer: CancellationToken,
}

impl ConnHandle {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Self { id: ConnId::next(), tx, closer: CancellationToken::new() };
        (handle, rx)
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Queue one outbound message. Best-effort: a closed peer drops the
    /// frame, a full queue terminates the connection as a slow peer.
    pub fn send<T: Serialize>(&self, msg: &T) {
        let text = match bh_wire::encode(msg) {
            Ok(text) => text,
            Err(e) => {
                warn!(conn = %self.id, error = %e, "failed to encode outbound frame");
                return;
            }
        };
        match self.tx.try_send(Utf8Bytes::from(text)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn = %self.id, "slow peer, terminating connection");
                self.closer.cancel();
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Ask the writer task to drain and close the connection.
    pub fn close(&self) {
        self.closer.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_cancelled()
    }

    /// Resolves when [`close`](Self::close) has been called.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closer.cancelled()
    }
}

impl std::fmt::Debug for ConnHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "conn_tests.rs"]
mod tests;
