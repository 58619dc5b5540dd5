// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Command passthrough specs: JSON-RPC over child stdin/stdout.

#![cfg(unix)]

use crate::prelude::*;
use serde_json::json;

/// An echo sandbox: consumes the bridge hint, then mirrors stdin.
async fn start_echo_sandbox(client: &mut Ws) -> (tempfile::TempDir, String) {
    let (dir, path) = script("read hint; while read line; do echo \"$line\"; done");
    send(
        client,
        json!({
            "type": "start",
            "config": {"scriptPath": path.clone()},
            "sandboxId": "sbA",
        }),
    )
    .await;
    recv_type(client, "sandbox_updated").await;
    (dir, path)
}

#[tokio::test]
async fn string_command_is_normalized_and_echoed_back_as_jsonrpc() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, _path) = start_echo_sandbox(&mut client).await;

    send(
        &mut client,
        json!({
            "type": "command",
            "sandboxId": "sbA",
            "command": "{\"jsonrpc\":\"2.0\",\"method\":\"tools/list\",\"params\":{},\"id\":1}",
        }),
    )
    .await;

    let sent = recv_type(&mut client, "command_sent").await;
    assert_eq!(sent["sandboxId"], "sbA");
    assert_eq!(sent["command"]["method"], "tools/list");
    assert_eq!(sent["command"]["id"], 1);

    // The echoed line is the request itself, not a response, so it
    // stays untagged
    let stdout = recv_type(&mut client, "stdout").await;
    assert_eq!(stdout["sandboxId"], "sbA");
    assert_eq!(stdout["isJson"], false);

    send(&mut client, json!({"type": "stop", "sandboxId": "sbA"})).await;
}

#[tokio::test]
async fn child_jsonrpc_responses_are_tagged_is_json() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    // The sandbox answers every request with a canned JSON-RPC response
    let (_dir, path) = script(
        "read hint; read line; echo '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"tools\":[]}}'",
    );

    send(
        &mut client,
        json!({
            "type": "start",
            "config": {"scriptPath": path},
            "sandboxId": "sbA",
        }),
    )
    .await;
    recv_type(&mut client, "sandbox_updated").await;

    send(
        &mut client,
        json!({
            "type": "command",
            "sandboxId": "sbA",
            "command": {"jsonrpc": "2.0", "method": "tools/list", "params": {}, "id": 1},
        }),
    )
    .await;
    recv_type(&mut client, "command_sent").await;

    let stdout = recv_type(&mut client, "stdout").await;
    assert_eq!(stdout["isJson"], true);
    let message: serde_json::Value =
        serde_json::from_str(stdout["message"].as_str().unwrap()).unwrap();
    assert_eq!(message["result"]["tools"], json!([]));
}

#[tokio::test]
async fn stderr_lines_are_forwarded_untagged() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, path) = script("read hint; echo oops >&2; sleep 1");

    send(
        &mut client,
        json!({
            "type": "start",
            "config": {"scriptPath": path},
            "sandboxId": "sbA",
        }),
    )
    .await;

    let stderr = recv_type(&mut client, "stderr").await;
    assert_eq!(stderr["message"], "oops");
    assert_eq!(stderr["isJson"], false);
}

#[tokio::test]
async fn invalid_command_json_is_a_protocol_error() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, _path) = start_echo_sandbox(&mut client).await;

    send(
        &mut client,
        json!({"type": "command", "sandboxId": "sbA", "command": "{not json"}),
    )
    .await;

    let error = recv_type(&mut client, "error").await;
    assert!(error["error"].as_str().unwrap().contains("not valid JSON"));

    send(&mut client, json!({"type": "stop", "sandboxId": "sbA"})).await;
}
