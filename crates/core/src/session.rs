// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Client session records.

use serde::{Deserialize, Serialize};

use crate::id::SessionId;

/// A connected client session. Sandboxes are owned by exactly one
/// session and die with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub id: SessionId,
    pub connected_at: u64,
}

impl ClientSession {
    pub fn new(id: SessionId, now_ms: u64) -> Self {
        Self { id, connected_at: now_ms }
    }
}
