// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Frame encoding and decoding.
//!
//! Transport framing belongs to the WebSocket layer; this module only
//! maps between JSON text and typed messages.

use serde::Serialize;
use thiserror::Error;

use super::Request;

/// Errors from protocol decoding and connection handling.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, unknown `type`, or a missing required field.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Serialize an outbound message to one JSON text frame.
pub fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Parse one inbound text frame into a [`Request`].
pub fn decode_request(text: &str) -> Result<Request, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
