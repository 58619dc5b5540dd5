// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Live registry of portals, client sessions, sandboxes, and bridge
//! channels.
//!
//! One value, held behind a single lock by the router; all mutation
//! happens between suspension points. The registry stores connection
//! handles only as routing references; disconnect detection always
//! originates at the connection tasks.

mod portals;
mod sandboxes;
mod tokens;

use std::collections::HashMap;

use bh_core::{
    AdmissionToken, BridgeClient, ClientSession, InstanceId, PortalId, Sandbox, SandboxKey,
    SessionId,
};
use indexmap::IndexMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::listener::ConnHandle;
use crate::supervisor::ChildHandle;

/// Errors from registry mutations.
#[derive(Debug, Error)]
pub(crate) enum RegistryError {
    #[error("bridge id {0} is already registered")]
    DuplicatePortal(PortalId),

    #[error("sandbox {0} already exists for this session")]
    DuplicateSandbox(SandboxKey),

    #[error("no connected bridge with id {0}")]
    UnknownPortal(PortalId),
}

pub(crate) struct TokenEntry {
    pub token: AdmissionToken,
    /// Cancelling disarms the expiry task.
    pub expiry: CancellationToken,
}

pub(crate) struct PortalEntry {
    pub portal: bh_core::Portal,
    pub conn: ConnHandle,
}

pub(crate) struct SessionEntry {
    pub session: ClientSession,
    pub conn: ConnHandle,
}

pub(crate) struct SandboxEntry {
    pub sandbox: Sandbox,
    pub child: Option<ChildHandle>,
}

pub(crate) struct BridgeEntry {
    pub bridge: BridgeClient,
    pub conn: ConnHandle,
}

/// In-memory state of every connected peer and running sandbox.
/// Rebuilt from scratch on every daemon start.
#[derive(Default)]
pub(crate) struct Registry {
    tokens: HashMap<PortalId, TokenEntry>,
    /// Insertion-ordered: "first available portal" means earliest
    /// registered and still live.
    portals: IndexMap<PortalId, PortalEntry>,
    sessions: HashMap<SessionId, SessionEntry>,
    /// Insertion-ordered: orphan assignment walks creation order.
    sandboxes: IndexMap<SandboxKey, SandboxEntry>,
    bridges: HashMap<InstanceId, BridgeEntry>,
    next_session: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- client sessions ---

    /// Open a session for a freshly classified client connection.
    pub fn open_session(&mut self, conn: ConnHandle, now_ms: u64) -> SessionId {
        self.next_session += 1;
        let id = SessionId::numbered(self.next_session);
        self.sessions.insert(id, SessionEntry { session: ClientSession::new(id, now_ms), conn });
        id
    }

    pub fn remove_session(&mut self, id: &SessionId) -> Option<SessionEntry> {
        self.sessions.remove(id)
    }

    pub fn session_conn(&self, id: &SessionId) -> Option<ConnHandle> {
        self.sessions.get(id).map(|entry| entry.conn.clone())
    }

    /// Connections of every live client session, for broadcasts.
    pub fn client_conns(&self) -> Vec<ConnHandle> {
        self.sessions.values().map(|entry| entry.conn.clone()).collect()
    }

    /// Every peer connection of any role, for shutdown.
    pub fn all_conns(&self) -> Vec<ConnHandle> {
        self.sessions
            .values()
            .map(|entry| entry.conn.clone())
            .chain(self.portals.values().map(|entry| entry.conn.clone()))
            .chain(self.bridges.values().map(|entry| entry.conn.clone()))
            .collect()
    }

    // --- bridge channels ---

    /// Record a sandbox-bridge-client channel. The target portal must
    /// be live at registration time.
    pub fn register_bridge(
        &mut self,
        bridge: BridgeClient,
        conn: ConnHandle,
    ) -> Result<(), RegistryError> {
        if !self.portals.contains_key(&bridge.portal) {
            return Err(RegistryError::UnknownPortal(bridge.portal));
        }
        self.bridges.insert(bridge.instance, BridgeEntry { bridge, conn });
        Ok(())
    }

    pub fn remove_bridge(&mut self, instance: &InstanceId) -> Option<BridgeEntry> {
        self.bridges.remove(instance)
    }
}


#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
