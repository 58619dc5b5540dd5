// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! WebSocket protocol for hub communication.
//!
//! Wire format: one JSON object per text frame, discriminated by a
//! `type` field. Field names are camelCase on the wire.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod effect;
mod jsonrpc;
mod request;
mod update;

pub use codec::{decode_request, encode, ProtocolError};
pub use effect::{BridgeReply, EffectKind, ForwardEnvelope, PortalForward, RoutingInfo};
pub use jsonrpc::{is_jsonrpc_response, normalize_command};
pub use request::{ChildMessage, RegisterOrigin, Request, StartConfig};
pub use update::{BridgeInfo, ConnectedSandbox, ConnectionInfo, SandboxInfo, Update};
