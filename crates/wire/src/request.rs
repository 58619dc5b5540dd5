// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

use std::collections::HashMap;

use bh_core::{InstanceId, PortalId, SandboxId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BridgeReply, EffectKind, ForwardEnvelope};

/// Sender role claimed in a `bridge_register` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterOrigin {
    /// A portal presenting an admission token.
    FlutterBridgePortal,
    /// A sandboxed child opening its interception channel.
    SandboxBridgeClient,
}

/// Sandbox launch configuration supplied by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConfig {
    pub script_path: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_flutter_bridge_id: Option<PortalId>,
}

/// Inbound message from any peer, discriminated by `type`.
///
/// The hub classifies a connection's role from the first message it
/// sends; [`Request::classifies_client`] marks the client-action set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Health check, allowed from any role.
    Ping,

    /// Mint a portal admission token.
    #[serde(rename_all = "camelCase")]
    GenerateBridgeId { request_id: String },

    /// Register a portal (token consumption) or a sandbox-bridge-client.
    #[serde(rename_all = "camelCase")]
    BridgeRegister {
        origin: RegisterOrigin,
        bridge_id: PortalId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capabilities: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sandbox_session_id: Option<SessionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actual_sandbox_id: Option<SandboxId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance_id: Option<InstanceId>,
    },

    /// Late capability report from a registered portal.
    #[serde(rename_all = "camelCase")]
    BridgeCapabilitiesReport { bridge_id: PortalId, capabilities: Value },

    /// Start a sandbox for a script.
    #[serde(rename_all = "camelCase")]
    Start { config: StartConfig, sandbox_id: SandboxId },

    /// Stop a sandbox, killing its process tree.
    #[serde(rename_all = "camelCase")]
    Stop { sandbox_id: SandboxId },

    /// Write one JSON-RPC request line to a sandbox child's stdin.
    /// `command` may be a JSON object or a string to be parsed.
    #[serde(rename_all = "camelCase")]
    Command { sandbox_id: SandboxId, command: Value },

    /// Request a portal-status snapshot.
    GetBridgeStatus,

    /// List sandboxes currently assigned to a portal.
    #[serde(rename_all = "camelCase")]
    GetConnectedSandboxes { bridge_id: PortalId },

    /// Portal reply to a previously forwarded effect.
    #[serde(rename_all = "camelCase")]
    BridgeResponseFromPortal { request_id: String, response: BridgeReply },

    // Intercepted effects, the closed forwardable set.
    FsRead(ForwardEnvelope),
    FsWrite(ForwardEnvelope),
    FsStat(ForwardEnvelope),
    FsList(ForwardEnvelope),
    FsMkdir(ForwardEnvelope),
    FsRmdir(ForwardEnvelope),
    FsUnlink(ForwardEnvelope),
    HttpRequest(ForwardEnvelope),
}

impl Request {
    /// The effect kind and envelope, when this is an intercepted call.
    pub fn effect(&self) -> Option<(EffectKind, &ForwardEnvelope)> {
        match self {
            Request::FsRead(env) => Some((EffectKind::FsRead, env)),
            Request::FsWrite(env) => Some((EffectKind::FsWrite, env)),
            Request::FsStat(env) => Some((EffectKind::FsStat, env)),
            Request::FsList(env) => Some((EffectKind::FsList, env)),
            Request::FsMkdir(env) => Some((EffectKind::FsMkdir, env)),
            Request::FsRmdir(env) => Some((EffectKind::FsRmdir, env)),
            Request::FsUnlink(env) => Some((EffectKind::FsUnlink, env)),
            Request::HttpRequest(env) => Some((EffectKind::HttpRequest, env)),
            _ => None,
        }
    }

    /// Whether this message classifies an unclassified connection as a
    /// client and opens a session for it.
    pub fn classifies_client(&self) -> bool {
        matches!(
            self,
            Request::GenerateBridgeId { .. }
                | Request::Start { .. }
                | Request::Stop { .. }
                | Request::Command { .. }
                | Request::GetBridgeStatus
                | Request::GetConnectedSandboxes { .. }
        )
    }
}

/// Out-of-band message the hub writes to each spawned child on stdin,
/// telling its interception shim which portal to target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildMessage {
    #[serde(rename_all = "camelCase")]
    BridgeRegister {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_flutter_bridge_id: Option<PortalId>,
        sandbox_session_id: SessionId,
        actual_sandbox_id: SandboxId,
    },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
