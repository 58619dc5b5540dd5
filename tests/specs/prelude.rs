// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Shared spec harness: an in-process hub plus raw-JSON WebSocket
//! peers, so the specs exercise the literal wire contract.

use std::time::Duration;

use bh_daemon::{startup, Config, Daemon};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for any single wait in the specs.
pub const SPEC_WAIT: Duration = Duration::from_secs(5);

pub struct TestHub {
    pub daemon: Daemon,
}

/// Start a hub on an ephemeral port with spec-friendly settings.
pub async fn start_hub() -> TestHub {
    start_hub_with(|_| {}).await
}

pub async fn start_hub_with(tweak: impl FnOnce(&mut Config)) -> TestHub {
    let mut config = Config {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        kill_grace: Duration::from_millis(50),
        executor: "sh".to_string(),
        ..Config::default()
    };
    tweak(&mut config);
    let daemon = startup(config).await.expect("hub starts on an ephemeral port");
    TestHub { daemon }
}

impl TestHub {
    /// Open a raw WebSocket peer against the hub.
    pub async fn connect(&self) -> Ws {
        let url = format!("ws://{}", self.daemon.addr());
        let (ws, _) = tokio::time::timeout(SPEC_WAIT, tokio_tungstenite::connect_async(&url))
            .await
            .expect("connect within deadline")
            .expect("WebSocket handshake");
        ws
    }
}

/// Send one JSON frame.
pub async fn send(ws: &mut Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.expect("send frame");
}

/// Receive the next JSON frame, skipping control frames.
/// Returns `None` when the peer closed the connection.
pub async fn recv(ws: &mut Ws) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + SPEC_WAIT;
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("frame within deadline")?;
        match msg {
            Ok(Message::Text(text)) => {
                return Some(serde_json::from_str(text.as_str()).expect("valid JSON frame"));
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Receive frames until one matches `msg_type`.
pub async fn recv_type(ws: &mut Ws, msg_type: &str) -> Value {
    loop {
        let Some(frame) = recv(ws).await else {
            panic!("connection closed while waiting for {msg_type}");
        };
        if frame["type"] == msg_type {
            return frame;
        }
    }
}

/// Wait for the connection to be closed by the hub.
pub async fn recv_close(ws: &mut Ws) {
    loop {
        if recv(ws).await.is_none() {
            return;
        }
    }
}

/// Write a shell script into a scratch directory.
pub fn script(contents: &str) -> (tempfile::TempDir, String) {
    use std::io::Write;
    let dir = tempfile::tempdir().expect("scratch dir");
    let path = dir.path().join("sandbox.sh");
    let mut file = std::fs::File::create(&path).expect("script file");
    writeln!(file, "{contents}").expect("write script");
    (dir, path.display().to_string())
}

/// Mint an admission token through `client` and return its id.
pub async fn mint_token(client: &mut Ws) -> String {
    send(client, serde_json::json!({"type": "generate_bridge_id", "requestId": "r-mint"})).await;
    let frame = recv_type(client, "bridge_id_generated").await;
    frame["bridgeId"].as_str().expect("bridgeId").to_string()
}

/// Mint a token and register a fresh connection as the portal.
/// Returns the portal socket and its id.
pub async fn register_portal(hub: &TestHub, client: &mut Ws) -> (Ws, String) {
    let bridge_id = mint_token(client).await;
    let mut portal = hub.connect().await;
    send(
        &mut portal,
        serde_json::json!({
            "type": "bridge_register",
            "origin": "flutter_bridge_portal",
            "bridgeId": bridge_id,
            "platform": "spec",
        }),
    )
    .await;
    let ack = recv_type(&mut portal, "bridge_registered").await;
    assert_eq!(ack["bridgeId"], bridge_id.as_str());
    (portal, bridge_id)
}

/// Poll until `check` passes or the spec deadline elapses.
pub async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + SPEC_WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Whether a process is still alive (signal 0 probe).
#[cfg(unix)]
pub fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
