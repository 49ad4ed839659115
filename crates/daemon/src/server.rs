// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-over-Unix-socket surface: pull endpoints, SSE push, focus API.
//!
//! The socket is owner-only (0600); that is the whole authentication
//! story. SSE fan-out rides the store's subscriptions: because store
//! broadcasts are non-blocking, a stalled client loses frames instead of
//! stalling the daemon, and clients reconcile with a pull on reconnect.

use crate::store::Store;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use grove_core::StateUpdate;
use grove_discovery::Intervals;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn into_io(self) -> std::io::Error {
        match self {
            ServerError::Io(e) => e,
        }
    }
}

/// Effective daemon configuration reported on `/api/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningConfig {
    pub intervals: Intervals,
    pub sessions_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Shared context for all handlers.
///
/// `store` is `None` until the engine is attached; every state-touching
/// endpoint answers 503 in that window.
pub struct ServerCtx {
    pub store: Option<Arc<Store>>,
    pub running: RunningConfig,
}

impl ServerCtx {
    pub fn new(store: Arc<Store>, running: RunningConfig) -> Self {
        Self {
            store: Some(store),
            running,
        }
    }

    fn store(&self) -> Result<&Arc<Store>, Response> {
        self.store.as_ref().ok_or_else(|| {
            (StatusCode::SERVICE_UNAVAILABLE, "engine not initialized").into_response()
        })
    }
}

/// Build the daemon router.
pub fn router(ctx: Arc<ServerCtx>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/state", get(api_state))
        .route("/api/workspaces", get(api_workspaces))
        .route("/api/sessions", get(api_sessions))
        .route("/api/config", get(api_config))
        .route("/api/focus", get(get_focus).post(set_focus))
        .route("/api/stream", get(api_stream))
        .with_state(ctx)
}

/// Bind the Unix socket: remove any stale file, create the parent 0755,
/// listen, then chmod the socket itself to 0600 before accepting.
///
/// A bind failure gets one retry after removing the path again; the
/// second failure is returned to the caller (fatal at startup).
pub fn bind_socket(path: &Path) -> Result<UnixListener, ServerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o755))?;
    }

    let listener = match try_bind(path) {
        Ok(listener) => listener,
        Err(first) => {
            debug!(path = %path.display(), error = %first, "bind failed, retrying once");
            let _ = std::fs::remove_file(path);
            try_bind(path)?
        }
    };

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

fn try_bind(path: &Path) -> Result<UnixListener, std::io::Error> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    UnixListener::bind(path)
}

/// Serve until the token is cancelled, then drain in-flight handlers.
pub async fn serve(
    listener: UnixListener,
    ctx: Arc<ServerCtx>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = router(ctx);
    info!("server accepting connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn api_state(State(ctx): State<Arc<ServerCtx>>) -> Response {
    match ctx.store() {
        Ok(store) => Json(store.get()).into_response(),
        Err(resp) => resp,
    }
}

async fn api_workspaces(State(ctx): State<Arc<ServerCtx>>) -> Response {
    match ctx.store() {
        Ok(store) => Json(store.workspaces()).into_response(),
        Err(resp) => resp,
    }
}

async fn api_sessions(State(ctx): State<Arc<ServerCtx>>) -> Response {
    match ctx.store() {
        Ok(store) => Json(store.sessions()).into_response(),
        Err(resp) => resp,
    }
}

async fn api_config(State(ctx): State<Arc<ServerCtx>>) -> Json<RunningConfig> {
    Json(ctx.running.clone())
}

#[derive(Debug, Serialize, Deserialize)]
struct FocusBody {
    #[serde(default)]
    paths: Vec<String>,
}

async fn get_focus(State(ctx): State<Arc<ServerCtx>>) -> Response {
    match ctx.store() {
        Ok(store) => Json(json!({ "paths": store.focus() })).into_response(),
        Err(resp) => resp,
    }
}

async fn set_focus(
    State(ctx): State<Arc<ServerCtx>>,
    Json(body): Json<FocusBody>,
) -> Response {
    match ctx.store() {
        Ok(store) => {
            let count = body.paths.len();
            store.set_focus(body.paths);
            Json(json!({ "focused": count })).into_response()
        }
        Err(resp) => resp,
    }
}

async fn api_stream(State(ctx): State<Arc<ServerCtx>>) -> Response {
    let store = match ctx.store() {
        Ok(store) => Arc::clone(store),
        Err(resp) => return resp,
    };

    let (id, rx) = store.subscribe();
    debug!(subscriber = id, "stream connected");

    // `: connected` comment first, then an initial snapshot when the
    // workspaces map is already populated
    let mut head = vec![Ok::<Event, Infallible>(Event::default().comment("connected"))];
    let workspaces = store.workspaces();
    if !workspaces.is_empty() {
        if let Ok(json) = serde_json::to_string(&StateUpdate::initial(workspaces)) {
            head.push(Ok(Event::default().data(json)));
        }
    }

    let updates = ReceiverStream::new(rx).filter_map(|update| {
        let frame = StateUpdate::from(&update);
        serde_json::to_string(&frame)
            .ok()
            .map(|json| Ok::<Event, Infallible>(Event::default().data(json)))
    });

    let stream = tokio_stream::iter(head).chain(updates);
    let sse = Sse::new(stream);

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        sse,
    )
        .into_response()
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
