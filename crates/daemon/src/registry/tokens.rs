// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Admission-token minting, consumption, and expiry.

use bh_core::{AdmissionToken, PortalId};
use tokio_util::sync::CancellationToken;

use super::{Registry, TokenEntry};

/// Alphabet for token ids: 8 hex chars, 32 bits of entropy.
const HEX: [char; 16] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f'];

impl Registry {
    /// Mint a fresh admission token.
    ///
    /// The id must be unique among live tokens *and* past or present
    /// portal ids (a consumed token becomes a portal id and is never
    /// reused); collisions retry. Returns the token and the
    /// cancellation token the caller arms its expiry task with.
    pub fn mint_token(&mut self, now_ms: u64, ttl_ms: u64) -> (AdmissionToken, CancellationToken) {
        let id = loop {
            let candidate = PortalId::from_string(nanoid::nanoid!(8, &HEX));
            if !self.tokens.contains_key(&candidate) && !self.portals.contains_key(&candidate) {
                break candidate;
            }
        };
        let token = AdmissionToken::mint(id, now_ms, ttl_ms);
        let expiry = CancellationToken::new();
        self.tokens.insert(id, TokenEntry { token: token.clone(), expiry: expiry.clone() });
        (token, expiry)
    }

    /// Atomically consume a token: remove it, disarm its expiry task,
    /// and report whether it existed and was still live. Expiry and
    /// consumption are mutually exclusive; a stale entry whose timer
    /// has not fired yet consumes as dead.
    pub fn consume_token(&mut self, id: &PortalId, now_ms: u64) -> bool {
        let Some(entry) = self.tokens.remove(id) else {
            return false;
        };
        entry.expiry.cancel();
        entry.token.is_live(now_ms)
    }

    /// Remove a token whose TTL elapsed. Called from the expiry task;
    /// a no-op when consumption won the race.
    pub fn expire_token(&mut self, id: &PortalId) -> bool {
        self.tokens.remove(id).is_some()
    }

    /// Ids of currently live tokens, for `bridge_validation_update`.
    pub fn live_token_ids(&self) -> Vec<PortalId> {
        let mut ids: Vec<PortalId> = self.tokens.keys().copied().collect();
        ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}
