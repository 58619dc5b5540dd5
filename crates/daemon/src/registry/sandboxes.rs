// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Sandbox table and portal assignment policy.

use std::collections::{BTreeMap, HashMap};

use bh_core::{PortalId, Sandbox, SandboxId, SandboxKey, SessionId};
use bh_wire::{ConnectedSandbox, ConnectionInfo, SandboxInfo};

use crate::supervisor::ChildHandle;

use super::{Registry, RegistryError, SandboxEntry};

impl Registry {
    /// Record a sandbox as not-yet-running. When no portal is
    /// requested, the earliest-registered live portal (if any) is
    /// assigned; the assignment is advisory until the child's bridge
    /// client actually connects.
    pub fn create_sandbox(
        &mut self,
        session: SessionId,
        id: SandboxId,
        script_path: String,
        env: HashMap<String, String>,
        requested_portal: Option<PortalId>,
        now_ms: u64,
    ) -> Result<SandboxKey, RegistryError> {
        let key = SandboxKey::new(session, id);
        if self.sandboxes.contains_key(&key) {
            return Err(RegistryError::DuplicateSandbox(key));
        }
        let mut sandbox = Sandbox::new(id, session, script_path, env, now_ms);
        sandbox.portal = requested_portal.or_else(|| self.first_portal());
        self.sandboxes.insert(key, SandboxEntry { sandbox, child: None });
        Ok(key)
    }

    /// Complete sandbox creation once the child process is up.
    pub fn attach_child(&mut self, key: &SandboxKey, child: ChildHandle) -> bool {
        match self.sandboxes.get_mut(key) {
            Some(entry) => {
                entry.sandbox.running = true;
                entry.child = Some(child);
                true
            }
            None => false,
        }
    }

    pub fn remove_sandbox(&mut self, key: &SandboxKey) -> Option<SandboxEntry> {
        self.sandboxes.shift_remove(key)
    }

    pub fn sandbox(&self, key: &SandboxKey) -> Option<&SandboxEntry> {
        self.sandboxes.get(key)
    }

    /// Child handle of a sandbox, when one is attached.
    pub fn sandbox_child(&self, key: &SandboxKey) -> Option<ChildHandle> {
        self.sandboxes.get(key).and_then(|entry| entry.child.clone())
    }

    /// Child handles of every running sandbox, for shutdown.
    pub fn all_children(&self) -> Vec<ChildHandle> {
        self.sandboxes.values().filter_map(|entry| entry.child.clone()).collect()
    }

    /// Keys of every sandbox owned by a session.
    pub fn session_sandboxes(&self, session: &SessionId) -> Vec<SandboxKey> {
        self.sandboxes
            .values()
            .filter(|entry| entry.sandbox.session == *session)
            .map(|entry| entry.sandbox.key())
            .collect()
    }

    /// Sandbox ids owned by a session, for error hints.
    pub fn session_sandbox_ids(&self, session: &SessionId) -> Vec<String> {
        self.sandboxes
            .values()
            .filter(|entry| entry.sandbox.session == *session)
            .map(|entry| entry.sandbox.id.to_string())
            .collect()
    }

    /// Assign every currently unassigned sandbox to a new portal, in
    /// sandbox-creation order. Existing assignments are sticky and
    /// never repointed.
    pub fn assign_orphans(&mut self, portal: PortalId) -> Vec<SandboxKey> {
        let mut assigned = Vec::new();
        for entry in self.sandboxes.values_mut() {
            if entry.sandbox.portal.is_none() {
                entry.sandbox.portal = Some(portal);
                assigned.push(entry.sandbox.key());
            }
        }
        assigned
    }

    /// Current assignment map for `bridge_assignments_update`.
    pub fn assignments(&self) -> BTreeMap<String, PortalId> {
        self.sandboxes
            .values()
            .filter_map(|entry| {
                entry.sandbox.portal.map(|portal| (entry.sandbox.id.to_string(), portal))
            })
            .collect()
    }

    /// Global sandbox rows for `connections_update`.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.sandboxes
            .values()
            .map(|entry| {
                let status = if entry.sandbox.running { "running" } else { "stopped" };
                ConnectionInfo {
                    id: entry.sandbox.id,
                    status: status.to_string(),
                    start_time: entry.sandbox.started_at,
                    script_path: entry.sandbox.script_path.clone(),
                }
            })
            .collect()
    }

    /// Sandboxes assigned to one portal, for
    /// `connected_sandboxes_update`.
    pub fn connected_to_portal(&self, portal: &PortalId) -> Vec<ConnectedSandbox> {
        self.sandboxes
            .values()
            .filter(|entry| entry.sandbox.portal.as_ref() == Some(portal))
            .map(|entry| ConnectedSandbox {
                sandbox_id: entry.sandbox.id,
                session_id: entry.sandbox.session,
                is_running: entry.sandbox.running,
                script_path: entry.sandbox.script_path.clone(),
            })
            .collect()
    }

    /// Wire detail for `sandbox_updated`.
    pub fn sandbox_info(&self, key: &SandboxKey) -> Option<SandboxInfo> {
        self.sandboxes.get(key).map(|entry| SandboxInfo {
            sandbox_id: entry.sandbox.id,
            is_running: entry.sandbox.running,
            script_path: entry.sandbox.script_path.clone(),
            bridge_id: entry.sandbox.portal,
        })
    }
}
