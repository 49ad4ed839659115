// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic workspace discovery with facet preservation.
//!
//! On every tick the external discovery runs and the store's workspaces
//! map is rebuilt: new nodes start bare, persisting nodes keep every
//! enrichment facet written by the other collectors. A workspace that
//! disappears and later returns starts with no stale enrichment.

use crate::engine::Collector;
use crate::store::Store;
use async_trait::async_trait;
use grove_core::{EnrichedWorkspace, Update};
use grove_discovery::Discovery;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Ticks slower than this are reported as an observability warning.
const SLOW_TICK: Duration = Duration::from_millis(500);

pub struct WorkspaceCollector {
    discovery: Arc<Discovery>,
    interval: Duration,
}

impl WorkspaceCollector {
    pub fn new(discovery: Arc<Discovery>, interval: Duration) -> Self {
        Self {
            discovery,
            interval,
        }
    }

    fn tick(&self, store: &Store) -> Option<Update> {
        let nodes = match self.discovery.discover() {
            Ok(nodes) => nodes,
            Err(e) => {
                // No partial update: keep the previous view intact
                debug!(error = %e, "discovery failed, skipping tick");
                return None;
            }
        };
        let scanned = nodes.len();

        let prev = store.get().workspaces;
        let mut next = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let mut ws = EnrichedWorkspace::new(node);
            if let Some(old) = prev.get(&ws.path_key()) {
                ws.copy_facets_from(old);
            }
            next.insert(ws.path_key(), ws);
        }

        if next == prev {
            return None;
        }
        Some(Update::workspaces("workspace", scanned, next))
    }
}

#[async_trait]
impl Collector for WorkspaceCollector {
    fn name(&self) -> &'static str {
        "workspace"
    }

    async fn run(
        &self,
        shutdown: CancellationToken,
        store: Arc<Store>,
        updates: mpsc::Sender<Update>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            if let Some(update) = self.tick(&store) {
                if updates.send(update).await.is_err() {
                    break;
                }
            }
            let elapsed = started.elapsed();
            if elapsed > SLOW_TICK {
                warn!(elapsed_ms = elapsed.as_millis() as u64, "slow workspace scan");
            }
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
