// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared daemon state with pub/sub fan-out.
//!
//! One reader-writer lock protects state, the subscriber list, and the
//! focus set. Subscriber sends are non-blocking: a full channel drops the
//! frame so no slow client can stall a collector. Updates are broadcast
//! in apply order; each subscriber sees a drop-tolerant subsequence.

use grove_core::{EnrichedWorkspace, Session, State, Update, UpdatePayload};
use parking_lot::RwLock;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

/// Per-subscriber channel capacity. A subscriber that falls more than
/// this many updates behind starts losing frames.
pub const SUBSCRIBER_BUFFER: usize = 100;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<Update>,
}

#[derive(Default)]
struct Inner {
    state: State,
    /// Focus paths exactly as supplied by the client
    focus: Vec<String>,
    /// Lower-cased focus paths for case-insensitive membership checks
    focus_folded: HashSet<String>,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
}

/// The authoritative in-memory state.
#[derive(Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the full state.
    pub fn get(&self) -> State {
        self.inner.read().state.clone()
    }

    /// Enriched workspaces, sorted by path.
    pub fn workspaces(&self) -> Vec<EnrichedWorkspace> {
        self.inner.read().state.workspace_list()
    }

    /// Merged sessions, sorted by id.
    pub fn sessions(&self) -> Vec<Session> {
        self.inner.read().state.session_list()
    }

    /// Apply one update and broadcast it to all subscribers.
    ///
    /// Workspaces payloads replace the map wholesale — the emitting
    /// collector is responsible for re-copying facets it does not own.
    pub fn apply_update(&self, update: Update) {
        let mut inner = self.inner.write();
        match &update.payload {
            UpdatePayload::Workspaces(map) => {
                inner.state.workspaces = map.clone();
            }
            UpdatePayload::Sessions(list) => {
                inner.state.sessions =
                    list.iter().map(|s| (s.id.clone(), s.clone())).collect();
            }
            UpdatePayload::Focus(paths) => {
                inner.replace_focus(paths);
            }
            UpdatePayload::ConfigReload(_) => {}
        }
        inner.broadcast(update);
    }

    /// Register a subscriber; returns its id and the receiving end.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<Update>) {
        let mut inner = self.inner.write();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        inner.subscribers.push(Subscriber { id, tx });
        (id, rx)
    }

    /// Remove a subscriber; its channel closes when the sender drops.
    pub fn unsubscribe(&self, id: u64) {
        self.inner.write().subscribers.retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }

    /// Replace the focus set atomically and broadcast a focus update.
    pub fn set_focus(&self, paths: Vec<String>) {
        let mut inner = self.inner.write();
        inner.replace_focus(&paths);
        inner.broadcast(Update::focus("api", paths));
    }

    /// Defensive copy of the focus set, sorted.
    pub fn focus(&self) -> Vec<String> {
        let mut paths = self.inner.read().focus.clone();
        paths.sort();
        paths.dedup();
        paths
    }

    pub fn focus_is_empty(&self) -> bool {
        self.inner.read().focus_folded.is_empty()
    }

    pub fn focus_len(&self) -> usize {
        self.inner.read().focus_folded.len()
    }

    /// Case-insensitive focus membership — focus paths may arrive from
    /// clients on case-insensitive filesystems with different casing.
    pub fn is_focused(&self, path: &str) -> bool {
        self.inner
            .read()
            .focus_folded
            .contains(&path.to_lowercase())
    }

    /// Broadcast-only notification that a config file changed.
    pub fn broadcast_config_reload(&self, file: &str) {
        self.inner.write().broadcast(Update::config_reload(file));
    }
}

impl Inner {
    fn replace_focus(&mut self, paths: &[String]) {
        self.focus = paths.to_vec();
        self.focus_folded = paths.iter().map(|p| p.to_lowercase()).collect();
    }

    /// Best-effort fan-out: full channels drop the frame, closed channels
    /// drop the subscriber.
    fn broadcast(&mut self, update: Update) {
        self.subscribers.retain(|sub| {
            match sub.tx.try_send(update.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    trace!(subscriber = sub.id, "subscriber full, dropping frame");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
