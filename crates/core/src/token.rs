// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Admission tokens.
//!
//! A portal must present a short-lived, single-use token to register.
//! The token id doubles as the portal id once consumed.

use serde::{Deserialize, Serialize};

use crate::id::PortalId;

/// A minted, not-yet-consumed admission token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionToken {
    pub id: PortalId,
    pub created_at: u64,
    pub expires_at: u64,
}

impl AdmissionToken {
    pub fn mint(id: PortalId, now_ms: u64, ttl_ms: u64) -> Self {
        Self { id, created_at: now_ms, expires_at: now_ms + ttl_ms }
    }

    /// A token is live until its expiry instant (exclusive).
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
