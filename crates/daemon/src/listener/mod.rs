// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! WebSocket listener and per-connection I/O tasks.
//!
//! The listener accepts connections and spawns a reader and a writer
//! task per peer, without blocking dispatch for other peers. A
//! connection is unclassified until its first registering message;
//! the read task owns the role state and reports the disconnect with
//! whatever role the connection settled into.

mod conn;

pub(crate) use conn::{ConnHandle, ConnId, ConnRole};

use std::net::SocketAddr;
use std::sync::Arc;

use bh_core::Clock;
use bh_wire::Update;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Message, Utf8Bytes};
use tracing::{debug, error, info, warn};

use crate::router::{ConnState, Hub};

/// Upper bound on a single inbound frame. Effect payloads are small;
/// anything bigger is a misbehaving peer.
const MAX_FRAME_BYTES: usize = 1 << 20;

/// Listener task accepting WebSocket connections for the hub.
pub(crate) struct Listener<C: Clock> {
    tcp: TcpListener,
    hub: Arc<Hub<C>>,
}

impl<C: Clock + 'static> Listener<C> {
    pub fn new(tcp: TcpListener, hub: Arc<Hub<C>>) -> Self {
        Self { tcp, hub }
    }

    /// Accept connections until the task is aborted at shutdown.
    pub async fn run(self) {
        loop {
            match self.tcp.accept().await {
                Ok((stream, addr)) => {
                    let hub = Arc::clone(&self.hub);
                    tokio::spawn(async move {
                        handle_socket(stream, addr, hub).await;
                    });
                }
                Err(e) => error!(error = %e, "accept error"),
            }
        }
    }
}

async fn handle_socket<C: Clock + 'static>(stream: TcpStream, addr: SocketAddr, hub: Arc<Hub<C>>) {
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(MAX_FRAME_BYTES))
        .max_frame_size(Some(MAX_FRAME_BYTES));

    let ws = match tokio_tungstenite::accept_async_with_config(stream, Some(ws_config)).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let (conn, rx) = ConnHandle::new(hub.config.send_queue);
    info!(conn = %conn.id(), %addr, "connection accepted");

    let (sink, mut inbound) = ws.split();
    tokio::spawn(write_loop(sink, rx, conn.clone()));

    let mut state = ConnState::new(conn.clone());
    loop {
        tokio::select! {
            msg = inbound.next() => match msg {
                Some(Ok(Message::Text(text))) => match bh_wire::decode_request(text.as_str()) {
                    Ok(req) => Arc::clone(&hub).dispatch(&mut state, req).await,
                    Err(e) => {
                        warn!(conn = %conn.id(), error = %e, "protocol error");
                        state.conn.send(&Update::error(e.to_string()));
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(conn = %conn.id(), error = %e, "read error");
                    break;
                }
                // Binary/Ping/Pong frames carry nothing for the hub
                _ => {}
            },
            _ = conn.closed() => break,
        }
    }

    info!(conn = %conn.id(), role = state.role.name(), "connection closed");
    hub.handle_disconnect(state).await;
    conn.close();
}

/// Drain the bounded outbound queue into the socket. On close, flush
/// whatever is already queued, then send a close frame.
async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Utf8Bytes>,
    conn: ConnHandle,
) where
    S: futures_util::Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = conn.closed() => {
                while let Ok(text) = rx.try_recv() {
                    if sink.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
