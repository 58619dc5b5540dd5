// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Sandbox records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{PortalId, SandboxId, SessionId};

/// Composite sandbox key. Sandbox ids are client-chosen, so two
/// sessions may pick the same id; the owning session disambiguates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SandboxKey {
    pub session: SessionId,
    pub sandbox: SandboxId,
}

impl SandboxKey {
    pub fn new(session: SessionId, sandbox: SandboxId) -> Self {
        Self { session, sandbox }
    }
}

impl std::fmt::Display for SandboxKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.session, self.sandbox)
    }
}

/// A sandbox: one child process running an untrusted script under
/// interception, owned by a client session and (optionally) assigned
/// to a portal that terminates its effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sandbox {
    pub id: SandboxId,
    pub session: SessionId,
    pub script_path: String,
    /// Extra environment for the child, merged over the hub's own.
    pub env: HashMap<String, String>,
    /// Assigned portal. Sticky once set: only sandbox destruction
    /// clears it.
    pub portal: Option<PortalId>,
    pub running: bool,
    pub started_at: u64,
}

impl Sandbox {
    pub fn new(
        id: SandboxId,
        session: SessionId,
        script_path: String,
        env: HashMap<String, String>,
        now_ms: u64,
    ) -> Self {
        Self { id, session, script_path, env, portal: None, running: false, started_at: now_ms }
    }

    pub fn key(&self) -> SandboxKey {
        SandboxKey::new(self.session, self.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.portal.is_some()
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
