// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

use std::collections::BTreeMap;

use bh_core::{PortalId, SandboxId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BridgeReply;

/// One sandbox row in a `connections_update` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: SandboxId,
    pub status: String,
    pub start_time: u64,
    pub script_path: String,
}

/// One portal row in a `bridge_status_update` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeInfo {
    pub bridge_id: PortalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub connected_at: u64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Value>,
}

/// Sandbox detail carried in `sandbox_updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxInfo {
    pub sandbox_id: SandboxId,
    pub is_running: bool,
    pub script_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<PortalId>,
}

/// One row in a `connected_sandboxes_update` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedSandbox {
    pub sandbox_id: SandboxId,
    pub session_id: SessionId,
    pub is_running: bool,
    pub script_path: String,
}

/// Outbound message from the hub to a client, portal, or
/// sandbox-bridge-client, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// Health check response.
    Pong,

    /// Freshly minted admission token.
    #[serde(rename_all = "camelCase")]
    BridgeIdGenerated { bridge_id: PortalId, expires_at: u64, request_id: String },

    /// Registration acknowledged (portal or sandbox-bridge-client).
    #[serde(rename_all = "camelCase")]
    BridgeRegistered { bridge_id: PortalId },

    /// Snapshot of this client's sandboxes.
    ConnectionsUpdate { connections: Vec<ConnectionInfo> },

    /// Snapshot of connected portals.
    BridgeStatusUpdate { bridges: Vec<BridgeInfo> },

    /// Currently live (unconsumed, unexpired) admission tokens.
    #[serde(rename_all = "camelCase")]
    BridgeValidationUpdate { valid_bridge_ids: Vec<PortalId> },

    /// Current sandbox→portal assignment map.
    BridgeAssignmentsUpdate { assignments: BTreeMap<String, PortalId> },

    /// A sandbox changed state (`sandbox: null` means destroyed).
    #[serde(rename_all = "camelCase")]
    SandboxUpdated { connection_id: SessionId, sandbox: Option<SandboxInfo> },

    /// A line of child stdout, classified for JSON-RPC shape.
    #[serde(rename_all = "camelCase")]
    Stdout { connection_id: SessionId, sandbox_id: SandboxId, message: String, is_json: bool },

    /// A line of child stderr.
    #[serde(rename_all = "camelCase")]
    Stderr { connection_id: SessionId, sandbox_id: SandboxId, message: String, is_json: bool },

    /// A command line was written to the child's stdin.
    #[serde(rename_all = "camelCase")]
    CommandSent { connection_id: SessionId, sandbox_id: SandboxId, command: Value },

    /// Sandboxes assigned to the queried portal.
    ConnectedSandboxesUpdate { sandboxes: Vec<ConnectedSandbox> },

    /// Reply to an intercepted call, real or synthesized.
    #[serde(rename_all = "camelCase")]
    BridgeResponse { request_id: String, response: BridgeReply },

    /// Error local to the message that provoked it.
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl Update {
    pub fn error(message: impl Into<String>) -> Self {
        Update::Error { error: message.into(), details: None }
    }

    pub fn error_with_details(message: impl Into<String>, details: Value) -> Self {
        Update::Error { error: message.into(), details: Some(details) }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
