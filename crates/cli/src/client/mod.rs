// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transparent daemon client.
//!
//! Application code gets one contract; whether it is served by the
//! daemon over the Unix socket or by in-process library calls is decided
//! once, at connect time: stat the socket, dial it with a short deadline,
//! and fall back to the local implementation when either fails. "Daemon
//! not running" is never a user-visible error — only streaming, which has
//! no local equivalent, refuses in local mode.

mod local;
mod remote;

pub use local::LocalClient;
pub use remote::{RemoteClient, StreamHandle};

use grove_core::{EnrichedWorkspace, NoteCounts, PlanStats, Session, State, WorkspaceNode};
use grove_daemon::RunningConfig;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UnixStream;

/// Deadline for the connect-time probe of the daemon socket.
const DIAL_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,

    #[error("daemon returned {0}: {1}")]
    Status(u16, String),

    #[error("{0} not available in local mode")]
    LocalMode(&'static str),

    #[error("could not determine state directory")]
    NoStateDir,
}

/// A client backed either by the daemon or by in-process calls.
pub enum Client {
    Remote(RemoteClient),
    Local(LocalClient),
}

impl Client {
    /// Connect transparently: prefer the daemon when its socket accepts
    /// within [`DIAL_TIMEOUT`], otherwise run in-process.
    pub async fn connect() -> Result<Self, ClientError> {
        let socket_path = remote::daemon_socket_path()?;
        if socket_path.exists() {
            let probe =
                tokio::time::timeout(DIAL_TIMEOUT, UnixStream::connect(&socket_path)).await;
            if matches!(probe, Ok(Ok(_))) {
                return Ok(Client::Remote(RemoteClient::new(socket_path)));
            }
        }
        Ok(Client::Local(LocalClient::new()?))
    }

    /// Whether requests are served by a running daemon.
    pub fn is_running(&self) -> bool {
        matches!(self, Client::Remote(_))
    }

    pub async fn get_workspaces(&self) -> Result<Vec<WorkspaceNode>, ClientError> {
        match self {
            Client::Remote(remote) => Ok(remote
                .get_enriched_workspaces()
                .await?
                .into_iter()
                .map(|w| w.node)
                .collect()),
            Client::Local(local) => local.get_workspaces(),
        }
    }

    pub async fn get_enriched_workspaces(&self) -> Result<Vec<EnrichedWorkspace>, ClientError> {
        match self {
            Client::Remote(remote) => remote.get_enriched_workspaces().await,
            Client::Local(local) => local.get_enriched_workspaces().await,
        }
    }

    pub async fn get_sessions(&self) -> Result<Vec<Session>, ClientError> {
        match self {
            Client::Remote(remote) => remote.get_sessions().await,
            Client::Local(local) => local.get_sessions(),
        }
    }

    /// Plan statistics keyed by workspace path.
    pub async fn get_plan_stats(&self) -> Result<HashMap<String, PlanStats>, ClientError> {
        match self {
            Client::Remote(remote) => {
                let map = remote
                    .get_enriched_workspaces()
                    .await?
                    .into_iter()
                    .filter_map(|w| Some((w.path_key(), w.plans.clone()?)))
                    .collect();
                Ok(map)
            }
            Client::Local(local) => local.get_plan_stats(),
        }
    }

    /// Note counts keyed by workspace name.
    pub async fn get_note_counts(&self) -> Result<HashMap<String, NoteCounts>, ClientError> {
        match self {
            Client::Remote(remote) => {
                let map = remote
                    .get_enriched_workspaces()
                    .await?
                    .into_iter()
                    .filter_map(|w| Some((w.node.name.clone(), w.notes.clone()?)))
                    .collect();
                Ok(map)
            }
            Client::Local(local) => local.get_note_counts(),
        }
    }

    pub async fn get_config(&self) -> Result<RunningConfig, ClientError> {
        match self {
            Client::Remote(remote) => remote.get_config().await,
            Client::Local(local) => Ok(local.get_config()),
        }
    }

    /// Replace the daemon's focus set; returns the accepted count.
    pub async fn set_focus(&self, paths: &[String]) -> Result<usize, ClientError> {
        match self {
            Client::Remote(remote) => remote.set_focus(paths).await,
            Client::Local(_) => Err(ClientError::LocalMode("focus")),
        }
    }

    /// Current focus set.
    pub async fn get_focus(&self) -> Result<Vec<String>, ClientError> {
        match self {
            Client::Remote(remote) => remote.get_focus().await,
            Client::Local(_) => Ok(Vec::new()),
        }
    }

    /// Pull a fresh full state.
    pub async fn refresh(&self) -> Result<State, ClientError> {
        match self {
            Client::Remote(remote) => remote.get_state().await,
            Client::Local(local) => local.refresh().await,
        }
    }

    /// Subscribe to the daemon's update stream.
    ///
    /// Fails in local mode — polling is the only option without the
    /// daemon.
    pub async fn stream_state(&self) -> Result<StreamHandle, ClientError> {
        match self {
            Client::Remote(remote) => remote.stream_state().await,
            Client::Local(_) => Err(ClientError::LocalMode("streaming")),
        }
    }

    /// Release client resources. Connections are per-request, so this is
    /// currently a no-op kept for contract symmetry.
    pub fn close(self) {}
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
