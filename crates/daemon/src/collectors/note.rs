// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic note-count enrichment.
//!
//! Note counts are keyed by workspace *name* and the fetch is
//! coarse-grained — one call covers every workspace — so this collector
//! ignores the focus set entirely.

use crate::engine::Collector;
use crate::store::Store;
use async_trait::async_trait;
use grove_core::Update;
use grove_core::WorkspaceNode;
use grove_discovery::fetch_note_counts;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Slightly behind the plan collector so workspaces populate first.
const INITIAL_DELAY: Duration = Duration::from_secs(3);

pub struct NoteCollector {
    interval: Duration,
}

impl NoteCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for NoteCollector {
    fn name(&self) -> &'static str {
        "note"
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
            let counts = fetch_note_counts(&nodes);

            let mut cloned = state.workspaces.clone();
            for ws in cloned.values_mut() {
                if let Some(c) = counts.get(&ws.node.name) {
                    ws.notes = Some(c.clone());
                }
            }

            if cloned != state.workspaces
                && updates
                    .send(Update::workspaces("note", nodes.len(), cloned))
                    .await
                    .is_err()
            {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "note_tests.rs"]
mod tests;
