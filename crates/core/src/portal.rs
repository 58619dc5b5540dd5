// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Portal records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::PortalId;

/// A registered portal: the external process that terminates
/// virtualized effects on behalf of sandboxes assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub id: PortalId,
    /// Platform tag reported at registration (e.g. "android", "macos").
    pub platform: Option<String>,
    /// Capability descriptor reported at or after registration.
    /// Opaque to the hub; forwarded to clients in status snapshots.
    pub capabilities: Option<Value>,
    pub connected_at: u64,
}

impl Portal {
    pub fn new(id: PortalId, platform: Option<String>, now_ms: u64) -> Self {
        Self { id, platform, capabilities: None, connected_at: now_ms }
    }
}
