// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, single-instance lock.

use crate::env;
use crate::server;
use fs2::FileExt;
use grove_discovery::GroveConfig;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Socket file name inside the runtime directory.
pub const SOCKET_FILE: &str = "groved.sock";

/// PID/lock file name, a sibling of the socket.
pub const PID_FILE: &str = "groved.pid";

/// Daemon configuration, resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory
    pub state_dir: PathBuf,
    /// Path to the Unix socket
    pub socket_path: PathBuf,
    /// Path to the PID/lock file
    pub pid_path: PathBuf,
    /// Path to the version file
    pub version_path: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
    /// Configuration directory watched for changes
    pub config_dir: PathBuf,
    /// Interactive session tracking directory
    pub sessions_dir: PathBuf,
    /// Merged grove configuration
    pub grove: GroveConfig,
}

impl Config {
    /// Resolve paths and load the layered configuration.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let runtime_dir = env::runtime_dir()?;
        let config_dir = env::config_dir()?;
        let grove = GroveConfig::load(&config_dir);
        let sessions_dir = grove
            .sessions_dir
            .clone()
            .unwrap_or_else(|| state_dir.join("sessions"));

        Ok(Self {
            socket_path: runtime_dir.join(SOCKET_FILE),
            pid_path: runtime_dir.join(PID_FILE),
            version_path: state_dir.join("groved.version"),
            log_path: state_dir.join("daemon.log"),
            config_dir,
            sessions_dir,
            grove,
            state_dir,
        })
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Live daemon state: holds the instance lock for the process lifetime.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Result of startup: the daemon state plus the bound listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

/// Start the daemon: lock, record pid/version, bind the socket.
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config) {
        Ok(result) => Ok(result),
        Err(e) => {
            // Lock failures mean another daemon owns these files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create directories (state, sessions, socket parent)
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.sessions_dir)?;

    // 2. Acquire the lock file FIRST, without truncating — truncation
    // before holding the lock would wipe the running daemon's PID
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID now that we hold the lock
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Write version file
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 4. Bind the socket (stale file removed, one retry, 0600 after listen)
    let listener = server::bind_socket(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e.into_io()))?;

    info!(socket = %config.socket_path.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
        },
        listener,
    })
}

impl DaemonState {
    /// Shutdown the daemon gracefully, removing runtime files.
    pub fn shutdown(&mut self) {
        info!("shutting down daemon");

        for path in [
            &self.config.socket_path,
            &self.config.pid_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove runtime file");
                }
            }
        }
        // Lock is released when self.lock_file drops

        info!("daemon shutdown complete");
    }
}

/// Remove runtime files after a failed startup.
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.pid_path,
        &config.version_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
