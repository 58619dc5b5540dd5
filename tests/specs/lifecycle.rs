// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Sandbox lifecycle specs: start, stop, and tree cleanup.

#![cfg(unix)]

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn start_reports_a_running_sandbox() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, path) = script("read hint; sleep 30");

    send(
        &mut client,
        json!({
            "type": "start",
            "config": {"scriptPath": path},
            "sandboxId": "sbA",
        }),
    )
    .await;

    let updated = recv_type(&mut client, "sandbox_updated").await;
    assert_eq!(updated["sandbox"]["sandboxId"], "sbA");
    assert_eq!(updated["sandbox"]["isRunning"], true);
    assert_eq!(updated["sandbox"]["scriptPath"], path);

    let connections = recv_type(&mut client, "connections_update").await;
    let row = &connections["connections"][0];
    assert_eq!(row["id"], "sbA");
    assert_eq!(row["status"], "running");
    assert!(row["startTime"].as_u64().unwrap() > 0);

    send(&mut client, json!({"type": "stop", "sandboxId": "sbA"})).await;
}

#[tokio::test]
async fn stop_kills_the_whole_process_tree() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;

    let dir = tempfile::tempdir().unwrap();
    let root_pidfile = dir.path().join("root.pid").display().to_string();
    let child_pidfile = dir.path().join("child.pid").display().to_string();
    // The script forks a grandchild; both pids land in scratch files
    let (_script_dir, path) = script(
        "read hint; sleep 30 & echo $! > \"$CHILD_PIDFILE\"; echo $$ > \"$ROOT_PIDFILE\"; wait",
    );

    send(
        &mut client,
        json!({
            "type": "start",
            "config": {
                "scriptPath": path,
                "env": {"ROOT_PIDFILE": root_pidfile, "CHILD_PIDFILE": child_pidfile},
            },
            "sandboxId": "sbA",
        }),
    )
    .await;
    recv_type(&mut client, "sandbox_updated").await;

    let root_pidfile_path = dir.path().join("root.pid");
    let child_pidfile_path = dir.path().join("child.pid");
    assert!(
        wait_for(|| root_pidfile_path.exists() && child_pidfile_path.exists()).await,
        "sandbox script should write its pid files"
    );
    let root_pid = std::fs::read_to_string(&root_pidfile_path).unwrap().trim().to_string();
    let child_pid = std::fs::read_to_string(&child_pidfile_path).unwrap().trim().to_string();
    assert!(process_alive(&root_pid));

    send(&mut client, json!({"type": "stop", "sandboxId": "sbA"})).await;

    // The stop reply carries isRunning:false after the kill completed
    let updated = recv_type(&mut client, "sandbox_updated").await;
    assert_eq!(updated["sandbox"]["isRunning"], false);

    assert!(wait_for(|| !process_alive(&root_pid)).await, "root survives stop");
    assert!(wait_for(|| !process_alive(&child_pid)).await, "descendant survives stop");
}

#[tokio::test]
async fn client_disconnect_kills_owned_sandboxes() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;

    let dir = tempfile::tempdir().unwrap();
    let pidfile = dir.path().join("root.pid").display().to_string();
    let (_script_dir, path) = script("read hint; echo $$ > \"$PIDFILE\"; sleep 30");

    // A portal so the sandbox gets an assignment to drop later
    let (_portal, bridge_id) = register_portal(&hub, &mut client).await;

    send(
        &mut client,
        json!({
            "type": "start",
            "config": {"scriptPath": path, "env": {"PIDFILE": pidfile}},
            "sandboxId": "sbA",
        }),
    )
    .await;
    recv_type(&mut client, "sandbox_updated").await;

    let pidfile_path = dir.path().join("root.pid");
    assert!(wait_for(|| pidfile_path.exists()).await);
    let pid = std::fs::read_to_string(&pidfile_path).unwrap().trim().to_string();

    // Client goes away without stopping its sandbox
    drop(client);

    assert!(wait_for(|| !process_alive(&pid)).await, "sandbox outlives its owner");

    // A later client sees no sandboxes on the portal. Its
    // classification snapshot (connections_update) arrives first.
    let mut observer = hub.connect().await;
    send(&mut observer, json!({"type": "get_connected_sandboxes", "bridgeId": bridge_id})).await;
    let connections = recv_type(&mut observer, "connections_update").await;
    assert!(connections["connections"].as_array().unwrap().is_empty());

    let reply = recv_type(&mut observer, "connected_sandboxes_update").await;
    assert!(reply["sandboxes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn child_exit_removes_the_sandbox() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, path) = script("read hint; exit 0");

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

    // The script exits on its own; the hub reaps and announces
    loop {
        let updated = recv_type(&mut client, "sandbox_updated").await;
        if updated["sandbox"].is_null() {
            break;
        }
    }
}

#[tokio::test]
async fn stopping_an_unknown_sandbox_reports_available_ones() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_dir, path) = script("read hint; sleep 30");

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

    send(&mut client, json!({"type": "stop", "sandboxId": "ghost"})).await;
    let error = recv_type(&mut client, "error").await;
    assert!(error["error"].as_str().unwrap().contains("ghost"));
    assert_eq!(error["details"]["availableSandboxes"][0], "sbA");

    send(&mut client, json!({"type": "stop", "sandboxId": "sbA"})).await;
}
