// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Best-effort JSON-RPC 2.0 helpers for the command passthrough path.

use serde_json::Value;

use super::codec::ProtocolError;

/// Whether a child output line is a JSON-RPC 2.0 response:
/// `{jsonrpc:"2.0", id, result|error}`. Never errors; anything that
/// fails to parse is simply not a response.
pub fn is_jsonrpc_response(line: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return false;
    };
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.get("jsonrpc").and_then(Value::as_str) == Some("2.0")
        && obj.contains_key("id")
        && (obj.contains_key("result") || obj.contains_key("error"))
}

/// Normalize a client-supplied command into a JSON-RPC request object.
///
/// Accepts either an object (used as-is) or a string holding the JSON
/// text of one.
pub fn normalize_command(command: &Value) -> Result<Value, ProtocolError> {
    let value = match command {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map_err(|e| ProtocolError::Malformed(format!("command is not valid JSON: {e}")))?,
        other => other.clone(),
    };
    if !value.is_object() {
        return Err(ProtocolError::Malformed("command must be a JSON-RPC object".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "jsonrpc_tests.rs"]
mod tests;
