// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Focus-aware git status polling with adaptive cadence.
//!
//! The tick interval tightens when few workspaces are in play and relaxes
//! on big machines. Focused workspaces are scanned every tick; everything
//! else is covered by a mandatory full scan at least once per
//! [`FULL_SCAN_INTERVAL`], which bounds worst-case staleness for
//! unfocused workspaces.

use crate::engine::Collector;
use crate::store::Store;
use async_trait::async_trait;
use grove_core::Update;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Unfocused workspaces are rescanned at least this often.
const FULL_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Scans slower than this are reported as an observability warning.
const SLOW_SCAN: Duration = Duration::from_millis(200);

pub struct GitCollector {
    base_interval: Duration,
    full_scan_interval: Duration,
}

impl GitCollector {
    pub fn new(base_interval: Duration) -> Self {
        Self {
            base_interval,
            full_scan_interval: FULL_SCAN_INTERVAL,
        }
    }

    /// Shorten the mandatory full-scan interval (used by tests).
    pub fn with_full_scan_interval(mut self, interval: Duration) -> Self {
        self.full_scan_interval = interval;
        self
    }
}

/// Effective tick interval for `n` workspaces in scope.
fn effective_interval(base: Duration, n: usize) -> Duration {
    if n <= 5 {
        (base / 4).max(Duration::from_millis(250))
    } else if n <= 15 {
        (base / 2).max(Duration::from_millis(500))
    } else if n <= 30 {
        base
    } else {
        base * 2
    }
}

/// Bounded worker pool size for parallel git calls.
fn pool_size() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus / 2).clamp(2, 8)
}

#[async_trait]
impl Collector for GitCollector {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn run(
        &self,
        shutdown: CancellationToken,
        store: Arc<Store>,
        updates: mpsc::Sender<Update>,
    ) {
        // Force a full scan on the first tick
        let mut last_full = Instant::now() - self.full_scan_interval;

        loop {
            let n = if store.focus_is_empty() {
                store.get().workspaces.len()
            } else {
                store.focus_len()
            };
            let interval = effective_interval(self.base_interval, n.max(1));

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let state = store.get();
            if state.workspaces.is_empty() {
                continue;
            }

            let full =
                store.focus_is_empty() || last_full.elapsed() >= self.full_scan_interval;
            let mut cloned = state.workspaces.clone();
            let to_scan: Vec<String> = cloned
                .keys()
                .filter(|path| full || store.is_focused(path))
                .cloned()
                .collect();
            if to_scan.is_empty() {
                continue;
            }
            if full {
                last_full = Instant::now();
            }

            let started = Instant::now();
            let results = scan_workspaces(&cloned, &to_scan).await;

            let mut changed = false;
            for (path, outcome) in results {
                let Some(ws) = cloned.get_mut(&path) else {
                    continue;
                };
                match outcome.status {
                    Some(status) => {
                        if ws.git.as_ref() != Some(&status) {
                            ws.git = Some(status);
                            changed = true;
                        }
                    }
                    // A failed git call keeps the previous status
                    None => debug!(path, "git status failed, keeping previous"),
                }
                if let Some(url) = outcome.remote_url {
                    if ws.remote_url.as_deref() != Some(url.as_str()) {
                        ws.remote_url = Some(url);
                        changed = true;
                    }
                }
            }

            let elapsed = started.elapsed();
            if elapsed > SLOW_SCAN {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    scanned = to_scan.len(),
                    "slow git scan"
                );
            }

            if changed
                && updates
                    .send(Update::workspaces("git", to_scan.len(), cloned))
                    .await
                    .is_err()
            {
                break;
            }
        }
    }
}

struct ScanOutcome {
    status: Option<grove_core::GitStatus>,
    remote_url: Option<String>,
}

/// Run git calls for the given paths under a bounded worker pool.
async fn scan_workspaces(
    workspaces: &HashMap<String, grove_core::EnrichedWorkspace>,
    to_scan: &[String],
) -> Vec<(String, ScanOutcome)> {
    let semaphore = Arc::new(Semaphore::new(pool_size()));
    let results = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut handles = Vec::with_capacity(to_scan.len());
    for path in to_scan {
        let want_remote = workspaces
            .get(path)
            .is_some_and(|ws| ws.remote_url.is_none());
        let path = path.clone();
        let semaphore = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            let dir = PathBuf::from(&path);
            let status = grove_discovery::git::collect_status(&dir).await.ok();
            let remote_url = if want_remote && status.is_some() {
                grove_discovery::git::remote_url(&dir).await
            } else {
                None
            };
            results.lock().push((path, ScanOutcome { status, remote_url }));
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    Arc::try_unwrap(results)
        .map(|m| m.into_inner())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
