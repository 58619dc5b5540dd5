// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Admission-token lifecycle specs.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn minted_token_has_id_expiry_and_request_echo() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;

    send(&mut client, json!({"type": "generate_bridge_id", "requestId": "r1"})).await;

    let frame = recv_type(&mut client, "bridge_id_generated").await;
    assert_eq!(frame["requestId"], "r1");
    let bridge_id = frame["bridgeId"].as_str().unwrap();
    assert_eq!(bridge_id.len(), 8);
    assert!(bridge_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(frame["expiresAt"].as_u64().unwrap() > 0);

    // The live token shows up in the validation broadcast
    let validation = recv_type(&mut client, "bridge_validation_update").await;
    assert_eq!(validation["validBridgeIds"][0], bridge_id);
}

#[tokio::test]
async fn register_within_ttl_succeeds() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;

    let (_portal, bridge_id) = register_portal(&hub, &mut client).await;

    // Skip the stale pre-registration snapshot; the broadcast that
    // follows registration must list the portal.
    loop {
        let status = recv_type(&mut client, "bridge_status_update").await;
        let found = status["bridges"]
            .as_array()
            .unwrap()
            .iter()
            .any(|bridge| bridge["bridgeId"] == bridge_id.as_str());
        if found {
            break;
        }
    }
}

#[tokio::test]
async fn expired_token_is_rejected_and_the_connection_closed() {
    let hub = start_hub_with(|config| {
        config.token_ttl = std::time::Duration::from_millis(150);
    })
    .await;
    let mut client = hub.connect().await;

    let bridge_id = mint_token(&mut client).await;
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    // The hub silently expired the token
    let mut portal = hub.connect().await;
    send(
        &mut portal,
        json!({
            "type": "bridge_register",
            "origin": "flutter_bridge_portal",
            "bridgeId": bridge_id,
        }),
    )
    .await;

    let error = recv_type(&mut portal, "error").await;
    assert!(error["error"].as_str().unwrap().contains("invalid or expired"));
    recv_close(&mut portal).await;
}

#[tokio::test]
async fn a_consumed_token_cannot_be_presented_twice() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;
    let (_portal, bridge_id) = register_portal(&hub, &mut client).await;

    let mut second = hub.connect().await;
    send(
        &mut second,
        json!({
            "type": "bridge_register",
            "origin": "flutter_bridge_portal",
            "bridgeId": bridge_id,
        }),
    )
    .await;

    recv_type(&mut second, "error").await;
    recv_close(&mut second).await;
}

#[tokio::test]
async fn malformed_frames_get_an_error_but_keep_the_connection() {
    let hub = start_hub().await;
    let mut client = hub.connect().await;

    send(&mut client, json!({"type": "warp_core_breach"})).await;
    let error = recv_type(&mut client, "error").await;
    assert!(error["error"].as_str().unwrap().contains("malformed"));

    // Still usable afterwards
    send(&mut client, json!({"type": "ping"})).await;
    recv_type(&mut client, "pong").await;
}
