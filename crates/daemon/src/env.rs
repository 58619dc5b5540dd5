// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

fn duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Listen port (`PORT`, default 3000).
pub fn port() -> u16 {
    std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(3000)
}

/// Bind address (`BH_BIND_ADDR`, default loopback).
pub fn bind_addr() -> String {
    std::env::var("BH_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Admission-token TTL (`BH_TOKEN_TTL_MS`, default 60s).
pub fn token_ttl() -> Duration {
    duration_ms("BH_TOKEN_TTL_MS", Duration::from_secs(60))
}

/// Pending-forward deadline (`BH_FORWARD_TIMEOUT_MS`, default 30s).
pub fn forward_timeout() -> Duration {
    duration_ms("BH_FORWARD_TIMEOUT_MS", Duration::from_secs(30))
}

/// SIGTERM→SIGKILL grace window for process-tree kills
/// (`BH_GRACE_MS`, default 100ms).
pub fn kill_grace() -> Duration {
    duration_ms("BH_GRACE_MS", Duration::from_millis(100))
}

/// Per-connection outbound queue capacity (`BH_SEND_QUEUE`, default 256).
pub fn send_queue() -> usize {
    std::env::var("BH_SEND_QUEUE").ok().and_then(|s| s.parse::<usize>().ok()).unwrap_or(256)
}

/// Executor program for sandbox scripts (`BH_EXECUTOR`, default `node`).
pub fn executor() -> String {
    std::env::var("BH_EXECUTOR").unwrap_or_else(|_| "node".to_string())
}

/// Optional log file path (`BH_LOG_FILE`). When unset, logs go to stderr.
pub fn log_file() -> Option<PathBuf> {
    std::env::var("BH_LOG_FILE").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
