// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Intercepted-call forwarding specs.

use crate::prelude::*;
use serde_json::json;

async fn register_bridge_client(hub: &TestHub, bridge_id: &str) -> Ws {
    let mut bridge = hub.connect().await;
    send(
        &mut bridge,
        json!({
            "type": "bridge_register",
            "origin": "sandbox_bridge_client",
            "bridgeId": bridge_id,
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "instanceId": "inst-1",
        }),
    )
    .await;
    recv_type(&mut bridge, "bridge_registered").await;
    bridge
}

#[tokio::test]
async fn happy_path_forwarding_round_trip() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (mut portal, bridge_id) = register_portal(&hub, &mut client).await;
    let mut bridge = register_bridge_client(&hub, &bridge_id).await;

    send(
        &mut bridge,
        json!({
            "type": "fs_read",
            "targetFlutterBridgeId": bridge_id,
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "requestId": "s-7",
            "payload": {"path": "/x"},
        }),
    )
    .await;

    // The portal sees the effect under a hub-minted forwarded-id
    let forwarded = recv_type(&mut portal, "fs_read").await;
    let forwarded_id = forwarded["requestId"].as_str().unwrap();
    assert!(forwarded_id.starts_with("F-"));
    assert_eq!(forwarded["payload"]["path"], "/x");
    assert_eq!(forwarded["routingInfo"]["targetFlutterBridgeId"], bridge_id.as_str());
    assert_eq!(forwarded["routingInfo"]["sandboxSessionId"], "C1");
    assert_eq!(forwarded["routingInfo"]["actualSandboxId"], "sbA");

    send(
        &mut portal,
        json!({
            "type": "bridge_response_from_portal",
            "requestId": forwarded_id,
            "response": {"data": "abc"},
        }),
    )
    .await;

    // The origin gets exactly its own request id back
    let reply = recv_type(&mut bridge, "bridge_response").await;
    assert_eq!(reply["requestId"], "s-7");
    assert_eq!(reply["response"]["data"], "abc");
}

#[tokio::test]
async fn forward_without_a_portal_fails_immediately() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (portal, bridge_id) = register_portal(&hub, &mut client).await;
    let mut bridge = register_bridge_client(&hub, &bridge_id).await;

    drop(portal);

    // Wait until the hub noticed the portal is gone: the disconnect
    // broadcast carries an empty bridge list
    loop {
        let status = recv_type(&mut client, "bridge_status_update").await;
        if status["bridges"].as_array().unwrap().is_empty() {
            break;
        }
    }

    send(
        &mut bridge,
        json!({
            "type": "fs_stat",
            "targetFlutterBridgeId": bridge_id,
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "requestId": "s-8",
            "payload": {"path": "/x"},
        }),
    )
    .await;

    let reply = recv_type(&mut bridge, "bridge_response").await;
    assert_eq!(reply["requestId"], "s-8");
    assert_eq!(reply["response"]["error"], "portal unavailable");
}

#[tokio::test]
async fn portal_vanishing_mid_flight_fails_the_forward() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (mut portal, bridge_id) = register_portal(&hub, &mut client).await;
    let mut bridge = register_bridge_client(&hub, &bridge_id).await;

    send(
        &mut bridge,
        json!({
            "type": "http_request",
            "targetFlutterBridgeId": bridge_id,
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "requestId": "s-9",
            "payload": {"url": "https://example.com"},
        }),
    )
    .await;
    recv_type(&mut portal, "http_request").await;

    // Portal dies before replying
    drop(portal);

    let reply = recv_type(&mut bridge, "bridge_response").await;
    assert_eq!(reply["requestId"], "s-9");
    assert_eq!(reply["response"]["error"], "peer disconnected");
}

#[tokio::test]
async fn forwarding_times_out_when_the_portal_never_replies() {
    let hub = start_hub_with(|config| {
        config.forward_timeout = std::time::Duration::from_millis(200);
    })
    .await;
    let mut client = hub.connect().await;
    let (mut portal, bridge_id) = register_portal(&hub, &mut client).await;
    let mut bridge = register_bridge_client(&hub, &bridge_id).await;

    send(
        &mut bridge,
        json!({
            "type": "fs_list",
            "targetFlutterBridgeId": bridge_id,
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "requestId": "s-10",
            "payload": {"path": "/"},
        }),
    )
    .await;
    recv_type(&mut portal, "fs_list").await;

    // No reply from the portal: the deadline fires
    let reply = recv_type(&mut bridge, "bridge_response").await;
    assert_eq!(reply["requestId"], "s-10");
    assert_eq!(reply["response"]["error"], "timeout");
}

#[tokio::test]
async fn effects_from_unregistered_connections_are_rejected() {
    let hub = start_hub().await;
    let mut stranger = hub.connect().await;

    send(
        &mut stranger,
        json!({
            "type": "fs_unlink",
            "targetFlutterBridgeId": "deadbeef",
            "sandboxSessionId": "C1",
            "actualSandboxId": "sbA",
            "requestId": "s-1",
            "payload": {"path": "/x"},
        }),
    )
    .await;

    let error = recv_type(&mut stranger, "error").await;
    assert!(error["error"].as_str().unwrap().contains("fs_unlink"));
}
