// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Bridge-client records.

use serde::{Deserialize, Serialize};

use crate::id::{InstanceId, PortalId, SandboxId, SessionId};

/// The interception channel a sandboxed child opens back to the hub.
/// Effects sent on it are routed to the target portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeClient {
    pub instance: InstanceId,
    pub session: SessionId,
    pub sandbox: SandboxId,
    pub portal: PortalId,
}
