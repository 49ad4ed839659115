// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic plan-statistics enrichment.
//!
//! Plan stats are keyed by workspace *path*. The collector is
//! focus-aware: while focus is set and the last full pass is recent,
//! only focused workspaces are refreshed.

use crate::engine::Collector;
use crate::store::Store;
use async_trait::async_trait;
use grove_core::Update;
use grove_core::WorkspaceNode;
use grove_discovery::fetch_plan_stats;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delay before the first fetch so the workspace collector populates first.
const INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Unfocused workspaces get a full plan pass at least this often.
const FULL_SCAN_WINDOW: Duration = Duration::from_secs(120);

pub struct PlanCollector {
    interval: Duration,
}

impl PlanCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for PlanCollector {
    fn name(&self) -> &'static str {
        "plan"
    }

    async fn run(
        &self,
        shutdown: CancellationToken,
        store: Arc<Store>,
        updates: mpsc::Sender<Update>,
    ) {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(INITIAL_DELAY) => {}
        }

        let mut last_full = Instant::now() - FULL_SCAN_WINDOW;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let state = store.get();
            if state.workspaces.is_empty() {
                continue;
            }

            let nodes: Vec<WorkspaceNode> =
                state.workspaces.values().map(|w| w.node.clone()).collect();
            let stats = fetch_plan_stats(&nodes);

            let focused_only =
                !store.focus_is_empty() && last_full.elapsed() < FULL_SCAN_WINDOW;
            if !focused_only {
                last_full = Instant::now();
            }

            let mut cloned = state.workspaces.clone();
            let mut scanned = 0;
            for (key, ws) in cloned.iter_mut() {
                if focused_only && !store.is_focused(key) {
                    continue;
                }
                scanned += 1;
                if let Some(s) = stats.get(key) {
                    ws.plans = Some(s.clone());
                }
            }

            if cloned != state.workspaces
                && updates
                    .send(Update::workspaces("plan", scanned, cloned))
                    .await
                    .is_err()
            {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
