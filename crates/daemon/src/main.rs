// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grove Daemon (groved)
//!
//! Background process that maintains the live workspace/session view and
//! serves it to local clients over a Unix socket.
//!
//! Architecture:
//! - Engine: one task per collector plus a single update consumer
//! - Server Task: axum over the Unix socket, pull endpoints + SSE
//! - Config Watcher: debounced fs watch triggering hooks and broadcasts

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use grove_daemon::collectors::{
    GitCollector, NoteCollector, PlanCollector, SessionCollector, WorkspaceCollector,
};
use grove_daemon::{
    configwatch::ConfigWatcher, env, lifecycle, server, Config, Engine, LifecycleError,
    RunningConfig, ServerCtx, Store,
};
use grove_discovery::Discovery;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("groved {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("groved {}", env!("CARGO_PKG_VERSION"));
                println!("Grove daemon - live workspace and session view over a Unix socket");
                println!();
                println!("USAGE:");
                println!("    groved");
                println!();
                println!("The daemon is typically started by the `grove` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for local clients.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: groved [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    // Load configuration
    let config = Config::load()?;

    // Rotate log file if it has grown too large
    rotate_log_if_needed(&config.log_path);

    // Set up logging
    let _log_guard = setup_logging(&config)?;

    info!("starting grove daemon");

    // Start daemon (lock, pid/version files, socket bind)
    let startup = match lifecycle::startup(&config) {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.pid_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("groved is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            return Err(e.into());
        }
    };
    let mut daemon = startup.daemon;
    let listener = startup.listener;

    // Single root cancellation context for every task
    let shutdown = CancellationToken::new();

    // Shared store and discovery provider
    let store = Arc::new(Store::new());
    let discovery = Arc::new(Discovery::new(config.grove.roots.clone()));
    let intervals = &config.grove.intervals;

    // Engine with the full collector set
    let mut engine = Engine::new(Arc::clone(&store));
    engine.register(WorkspaceCollector::new(
        Arc::clone(&discovery),
        Duration::from_secs(intervals.workspace_secs),
    ));
    engine.register(GitCollector::new(Duration::from_secs(intervals.git_secs)));
    engine.register(PlanCollector::new(Duration::from_secs(intervals.plan_secs)));
    engine.register(NoteCollector::new(Duration::from_secs(intervals.note_secs)));
    engine.register(SessionCollector::new(
        config.sessions_dir.clone(),
        Arc::clone(&discovery),
        env::opencode_storage_dir(),
        Duration::from_secs(intervals.pid_verify_secs),
        Duration::from_secs(intervals.session_rescan_secs),
    ));
    let engine_handles = engine.start(shutdown.clone());

    // Config watcher: hooks first, then a config_reload broadcast
    let watcher_store = Arc::clone(&store);
    let config_watcher = ConfigWatcher::new(
        config.config_dir.clone(),
        config.grove.hooks.clone(),
        Duration::from_millis(intervals.config_debounce_ms),
    );
    let watcher_handle = match config_watcher.spawn(shutdown.clone(), move |file| {
        watcher_store.broadcast_config_reload(file);
    }) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "config watcher unavailable");
            None
        }
    };

    // HTTP server over the Unix socket
    let ctx = Arc::new(ServerCtx::new(
        Arc::clone(&store),
        RunningConfig {
            intervals: intervals.clone(),
            sessions_dir: config.sessions_dir.clone(),
            started_at: Utc::now(),
        },
    ));
    let server_token = shutdown.clone();
    let server_handle =
        tokio::spawn(async move { server::serve(listener, ctx, server_token).await });

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "daemon ready");

    // Signal ready for parent process (CLI waiting for startup)
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
    shutdown.cancel();

    // Drain the server, then the collectors
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("server error: {}", e),
        Err(e) => error!("server task panicked: {}", e),
    }
    for handle in engine_handles {
        let _ = handle.await;
    }
    if let Some(handle) = watcher_handle {
        let _ = handle.await;
    }

    daemon.shutdown();
    info!("daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently
/// ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
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

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
