// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Intercepted-effect envelopes.
//!
//! The hub never inspects effect payloads; it routes them. The set of
//! forwardable types is closed: anything else arriving on a bridge
//! channel is a protocol error.

use bh_core::{PortalId, SandboxId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of forwardable effect types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    FsRead,
    FsWrite,
    FsStat,
    FsList,
    FsMkdir,
    FsRmdir,
    FsUnlink,
    HttpRequest,
}

impl EffectKind {
    pub const ALL: [EffectKind; 8] = [
        EffectKind::FsRead,
        EffectKind::FsWrite,
        EffectKind::FsStat,
        EffectKind::FsList,
        EffectKind::FsMkdir,
        EffectKind::FsRmdir,
        EffectKind::FsUnlink,
        EffectKind::HttpRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::FsRead => "fs_read",
            EffectKind::FsWrite => "fs_write",
            EffectKind::FsStat => "fs_stat",
            EffectKind::FsList => "fs_list",
            EffectKind::FsMkdir => "fs_mkdir",
            EffectKind::FsRmdir => "fs_rmdir",
            EffectKind::FsUnlink => "fs_unlink",
            EffectKind::HttpRequest => "http_request",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an intercepted call sent by a sandbox-bridge-client.
///
/// `request_id` is sandbox-local; the hub mints its own forwarded-id
/// before the message reaches the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardEnvelope {
    pub target_flutter_bridge_id: PortalId,
    pub sandbox_session_id: SessionId,
    pub actual_sandbox_id: SandboxId,
    pub request_id: String,
    #[serde(default)]
    pub payload: Value,
}

/// Routing metadata attached to an effect when the hub forwards it to
/// a portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingInfo {
    pub target_flutter_bridge_id: PortalId,
    pub sandbox_session_id: SessionId,
    pub actual_sandbox_id: SandboxId,
}

/// An effect as delivered to a portal: same `type` as the inbound
/// envelope, but carrying the hub's forwarded-id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalForward {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub request_id: String,
    pub payload: Value,
    pub routing_info: RoutingInfo,
}

/// Outcome of a virtualized effect, as reported by a portal or
/// synthesized by the hub on timeout / peer loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeReply {
    pub fn error(message: impl Into<String>) -> Self {
        Self { data: None, error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
