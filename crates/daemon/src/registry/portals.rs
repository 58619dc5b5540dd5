// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Portal registration and status snapshots.

use bh_core::{Portal, PortalId};
use bh_wire::BridgeInfo;
use serde_json::Value;

use crate::listener::ConnHandle;

use super::{PortalEntry, Registry, RegistryError};

impl Registry {
    /// Add a portal. The caller has already consumed the matching
    /// admission token; a live duplicate is rejected.
    pub fn register_portal(
        &mut self,
        portal: Portal,
        conn: ConnHandle,
    ) -> Result<(), RegistryError> {
        if self.portals.contains_key(&portal.id) {
            return Err(RegistryError::DuplicatePortal(portal.id));
        }
        self.portals.insert(portal.id, PortalEntry { portal, conn });
        Ok(())
    }

    /// Remove a portal. Triggered only by its connection closing.
    pub fn remove_portal(&mut self, id: &PortalId) -> Option<PortalEntry> {
        // shift_remove keeps insertion order for the survivors
        self.portals.shift_remove(id)
    }

    pub fn portal_conn(&self, id: &PortalId) -> Option<ConnHandle> {
        self.portals.get(id).map(|entry| entry.conn.clone())
    }

    /// Earliest-registered live portal, the default assignment target.
    pub fn first_portal(&self) -> Option<PortalId> {
        self.portals.keys().next().copied()
    }

    /// Attach a late capability report to a portal record.
    pub fn set_capabilities(&mut self, id: &PortalId, capabilities: Value) -> bool {
        match self.portals.get_mut(id) {
            Some(entry) => {
                entry.portal.capabilities = Some(capabilities);
                true
            }
            None => false,
        }
    }

    /// Status rows for `bridge_status_update`.
    pub fn bridge_status(&self) -> Vec<BridgeInfo> {
        self.portals
            .values()
            .map(|entry| BridgeInfo {
                bridge_id: entry.portal.id,
                platform: entry.portal.platform.clone(),
                connected_at: entry.portal.connected_at,
                status: "connected".to_string(),
                capabilities: entry.portal.capabilities.clone(),
            })
            .collect()
    }
}
