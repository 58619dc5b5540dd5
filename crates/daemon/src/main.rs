// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! bridgehub daemon (bhd)
//!
//! Foreground process that confines untrusted child scripts and routes
//! their intercepted effects to external portals over WebSockets.
//!
//! Architecture:
//! - Listener task: accepts peers, one reader/writer task pair each
//! - Router: shared state machine behind a single registry lock
//! - Supervisor: child process trees, killed as a unit

use std::path::Path;

use bh_daemon::{startup, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Handle info flags before touching the environment or the port
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("bhd {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--help" | "-h" | "help" => {
                println!("bhd {}", env!("CARGO_PKG_VERSION"));
                println!("bridgehub daemon - sandbox hub routing intercepted effects to portals");
                println!();
                println!("USAGE:");
                println!("    bhd");
                println!();
                println!("Listens on PORT (default 3000) for WebSocket peers: clients,");
                println!("portals, and sandbox bridge channels.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: bhd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let _log_guard = setup_logging();

    let config = Config::from_env();
    let daemon = match startup(config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "failed to start hub");
            eprintln!("bhd: {e}");
            std::process::exit(1);
        }
    };

    wait_for_shutdown().await;

    info!("shutting down");
    daemon.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            _ => {
                error!("failed to install signal handlers");
                std::future::pending::<()>().await;
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received ctrl-c");
    }
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Set up tracing: stderr by default, a non-blocking file appender
/// when `BH_LOG_FILE` is set. Returns the appender guard, which must
/// live for the process lifetime.
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match bh_daemon::env::log_file() {
        Some(path) => {
            rotate_log_if_needed(&path);
            let (dir, name) = match (path.parent(), path.file_name()) {
                (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_owned()),
                _ => {
                    eprintln!("bhd: invalid BH_LOG_FILE path: {}", path.display());
                    std::process::exit(1);
                }
            };
            let _ = std::fs::create_dir_all(&dir);
            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            None
        }
    }
}

/// Rotate the log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `bhd.log` → `bhd.log.1` → … → `bhd.log.3`, deleting the
/// oldest. Best-effort: rotation failures are silently ignored so the
/// daemon still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}
