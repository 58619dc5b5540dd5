// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Wall-clock abstraction for testable expiry math.
//!
//! The hub stamps everything (token expiry, portal connect times,
//! sandbox start times) in epoch milliseconds; deadline timers live in
//! the async runtime, not here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock epoch milliseconds.
pub trait Clock: Clone + Send + Sync {
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Fake clock for tests with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { epoch_ms: Arc::new(AtomicU64::new(1_000_000)) }
    }

    /// Advance the wall clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.epoch_ms.fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Set the wall-clock epoch milliseconds value.
    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.store(ms, Ordering::Relaxed);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
