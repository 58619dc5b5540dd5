// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Daemon startup and shutdown.
//!
//! [`startup`] binds the listener and spawns the accept loop; the
//! returned [`Daemon`] is the embedding surface for the `bhd` binary
//! and the workspace specs. All hub state is in-memory and rebuilt on
//! every start.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bh_core::SystemClock;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::env;
use crate::listener::Listener;
use crate::router::Hub;
use crate::supervisor;

/// Daemon configuration. [`Config::from_env`] reads the environment;
/// specs construct values directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Admission-token TTL (default 60s).
    pub token_ttl: Duration,
    /// Pending-forward deadline (default 30s).
    pub forward_timeout: Duration,
    /// SIGTERM→SIGKILL grace window for `kill_tree` (default 100ms).
    pub kill_grace: Duration,
    /// Per-connection outbound queue capacity.
    pub send_queue: usize,
    /// Executor program that runs sandbox scripts.
    pub executor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 3000,
            token_ttl: Duration::from_secs(60),
            forward_timeout: Duration::from_secs(30),
            kill_grace: Duration::from_millis(100),
            send_queue: 256,
            executor: "node".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::bind_addr(),
            port: env::port(),
            token_ttl: env::token_ttl(),
            forward_timeout: env::forward_timeout(),
            kill_grace: env::kill_grace(),
            send_queue: env::send_queue(),
            executor: env::executor(),
        }
    }
}

/// Fatal startup errors. Anything here exits the process non-zero.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
}

/// A running hub: bound listener plus shared state.
pub struct Daemon {
    addr: SocketAddr,
    hub: Arc<Hub<SystemClock>>,
    accept_task: JoinHandle<()>,
}

/// Bind the listener and start accepting peers.
pub async fn startup(config: Config) -> Result<Daemon, LifecycleError> {
    let bind = format!("{}:{}", config.bind_addr, config.port);
    let tcp = TcpListener::bind(&bind)
        .await
        .map_err(|e| LifecycleError::Bind { addr: bind.clone(), source: e })?;
    let addr = tcp
        .local_addr()
        .map_err(|e| LifecycleError::Bind { addr: bind, source: e })?;

    let hub = Arc::new(Hub::new(config, SystemClock));
    let listener = Listener::new(tcp, Arc::clone(&hub));
    let accept_task = tokio::spawn(listener.run());

    info!(%addr, "hub listening");
    Ok(Daemon { addr, hub, accept_task })
}

impl Daemon {
    /// The bound listen address (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting, kill every sandbox tree, and close all peers.
    pub async fn shutdown(self) {
        self.accept_task.abort();

        let (children, conns) = {
            let registry = self.hub.registry.lock();
            (registry.all_children(), registry.all_conns())
        };

        for child in children {
            if let Err(e) = supervisor::kill_tree(child.pid(), self.hub.config.kill_grace).await {
                warn!(pid = child.pid(), error = %e, "kill_tree failed during shutdown");
            }
        }
        for conn in conns {
            conn.close();
        }

        info!("hub stopped");
    }
}
