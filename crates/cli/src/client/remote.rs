// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client over the daemon's Unix socket.
//!
//! One connection per request, a 10 second deadline on everything except
//! `/api/stream`, which stays open for the process lifetime. The stream
//! reader tolerates very large frames — a single update may carry every
//! enriched workspace — and silently drops anything it cannot parse.

use super::ClientError;
use grove_core::{EnrichedWorkspace, Session, State, StateUpdate};
use grove_daemon::RunningConfig;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::client::conn::http1;
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Deadline for ordinary requests. The stream has none.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A single SSE frame may carry many enriched workspaces.
const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Resolve the daemon socket path the same way the daemon does.
pub(crate) fn daemon_socket_path() -> Result<PathBuf, ClientError> {
    let dir = grove_daemon::env::runtime_dir().map_err(|_| ClientError::NoStateDir)?;
    Ok(dir.join(grove_daemon::lifecycle::SOCKET_FILE))
}

/// Live subscription to the daemon's update stream.
///
/// Dropping the handle tears the connection down.
#[derive(Debug)]
pub struct StreamHandle {
    pub rx: mpsc::Receiver<StateUpdate>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub async fn next(&mut self) -> Option<StateUpdate> {
        self.rx.recv().await
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct RemoteClient {
    socket_path: PathBuf,
}

impl RemoteClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub async fn get_state(&self) -> Result<State, ClientError> {
        self.get_json("/api/state").await
    }

    pub async fn get_enriched_workspaces(&self) -> Result<Vec<EnrichedWorkspace>, ClientError> {
        self.get_json("/api/workspaces").await
    }

    pub async fn get_sessions(&self) -> Result<Vec<Session>, ClientError> {
        self.get_json("/api/sessions").await
    }

    pub async fn get_config(&self) -> Result<RunningConfig, ClientError> {
        self.get_json("/api/config").await
    }

    pub async fn get_focus(&self) -> Result<Vec<String>, ClientError> {
        #[derive(serde::Deserialize)]
        struct FocusResponse {
            paths: Vec<String>,
        }
        let resp: FocusResponse = self.get_json("/api/focus").await?;
        Ok(resp.paths)
    }

    pub async fn set_focus(&self, paths: &[String]) -> Result<usize, ClientError> {
        #[derive(serde::Deserialize)]
        struct SetFocusResponse {
            focused: usize,
        }
        let body = serde_json::to_string(&serde_json::json!({ "paths": paths }))?;
        let bytes = self
            .request(Method::POST, "/api/focus", Some(body))
            .await?;
        let resp: SetFocusResponse = serde_json::from_slice(&bytes)?;
        Ok(resp.focused)
    }

    /// Open the SSE stream and spawn a reader task feeding parsed frames
    /// into a channel.
    pub async fn stream_state(&self) -> Result<StreamHandle, ClientError> {
        let mut sender = self.handshake().await?;
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/stream")
            .header(HOST, "groved")
            .body(Full::new(Bytes::new()))?;
        let response = sender.send_request(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16(), String::new()));
        }

        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(read_stream(response.into_body(), tx));
        Ok(StreamHandle { rx, task })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let bytes = self.request(Method::GET, path, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Bytes, ClientError> {
        let work = async {
            let mut sender = self.handshake().await?;
            let builder = Request::builder()
                .method(method)
                .uri(path)
                .header(HOST, "groved");
            let request = match body {
                Some(json) => builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Full::new(Bytes::from(json)))?,
                None => builder.body(Full::new(Bytes::new()))?,
            };
            let response = sender.send_request(request).await?;
            let status = response.status();
            let bytes = response.into_body().collect().await?.to_bytes();
            if !status.is_success() {
                return Err(ClientError::Status(
                    status.as_u16(),
                    String::from_utf8_lossy(&bytes).into_owned(),
                ));
            }
            Ok(bytes)
        };
        tokio::time::timeout(REQUEST_TIMEOUT, work)
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    async fn handshake(
        &self,
    ) -> Result<http1::SendRequest<Full<Bytes>>, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let io = TokioIo::new(stream);
        let (sender, conn) = http1::handshake(io).await?;
        tokio::spawn(async move {
            let _ = conn.await;
        });
        Ok(sender)
    }
}

/// Incrementally parse SSE frames out of the response body.
///
/// Malformed frames are dropped; the channel closes when the daemon does.
async fn read_stream(mut body: Incoming, tx: mpsc::Sender<StateUpdate>) {
    let mut buffer = String::new();
    let mut data = String::new();

    while let Some(frame) = body.frame().await {
        let Ok(frame) = frame else { break };
        let Some(chunk) = frame.data_ref() else {
            continue;
        };
        buffer.push_str(&String::from_utf8_lossy(chunk));
        if buffer.len() > MAX_FRAME_SIZE {
            // Runaway line: drop the buffer rather than the connection
            buffer.clear();
            data.clear();
            continue;
        }

        while let Some(newline) = buffer.find('\n') {
            let line = buffer[..newline].trim_end_matches('\r').to_string();
            buffer.drain(..=newline);

            if let Some(payload) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(payload.trim_start());
            } else if line.is_empty() && !data.is_empty() {
                // Blank line terminates the event
                if let Ok(update) = serde_json::from_str::<StateUpdate>(&data) {
                    if tx.send(update).await.is_err() {
                        return;
                    }
                }
                data.clear();
            }
            // comment lines (`: connected`) and unknown fields fall through
        }
    }
}
