// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merged session tracking from three disjoint sources.
//!
//! Four concurrent concerns inside one task: a filesystem watcher over
//! the sessions directory (latency optimisation only), a PID-verification
//! timer (authoritative for interactive liveness), a flow/opencode rescan
//! timer (authoritative for the other two registries), and event
//! handling. A missed fs event is recovered within one verification or
//! rescan cycle. Every mutation emits the full merged list.

mod flow;
mod interactive;
mod opencode;

pub use flow::scan_flow_jobs;
pub use interactive::{load_session, pid_alive};
pub use opencode::scan_opencode;

use crate::engine::Collector;
use crate::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use grove_core::metadata::{METADATA_FILE, PID_FILE};
use grove_core::{merge_sessions, Session, Update, WorkspaceNode};
use grove_discovery::Discovery;
use interactive::TrackedSession;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Grace period between observing a dead PID and removing the session's
/// on-disk directory.
const CLEANUP_GRACE: Duration = Duration::from_secs(2);

pub struct SessionCollector {
    sessions_dir: PathBuf,
    discovery: Arc<Discovery>,
    opencode_dir: Option<PathBuf>,
    pid_verify_interval: Duration,
    rescan_interval: Duration,
    cleanup_grace: Duration,
}

impl SessionCollector {
    pub fn new(
        sessions_dir: PathBuf,
        discovery: Arc<Discovery>,
        opencode_dir: Option<PathBuf>,
        pid_verify_interval: Duration,
        rescan_interval: Duration,
    ) -> Self {
        Self {
            sessions_dir,
            discovery,
            opencode_dir,
            pid_verify_interval,
            rescan_interval,
            cleanup_grace: CLEANUP_GRACE,
        }
    }

    /// Shorten the cleanup grace (used by tests).
    pub fn with_cleanup_grace(mut self, grace: Duration) -> Self {
        self.cleanup_grace = grace;
        self
    }

    fn scan_flow(&self, store: &Store) -> Vec<Session> {
        // Prefer the daemon's cached workspace list; fall back to an
        // in-process discovery pass before the workspace collector has run
        let cached = store.get().workspaces;
        let nodes: Vec<WorkspaceNode> = if cached.is_empty() {
            self.discovery.discover().unwrap_or_default()
        } else {
            cached.values().map(|w| w.node.clone()).collect()
        };
        flow::scan_flow_jobs(&nodes, &self.discovery)
    }

    fn scan_opencode(&self) -> Vec<Session> {
        match &self.opencode_dir {
            Some(dir) => opencode::scan_opencode(dir, Utc::now()),
            None => Vec::new(),
        }
    }

    fn handle_event(
        &self,
        watcher: Option<&mut RecommendedWatcher>,
        registry: &mut HashMap<String, TrackedSession>,
        event: notify::Event,
    ) {
        let mut watcher = watcher;
        for path in &event.paths {
            let Some(parent) = path.parent() else {
                continue;
            };

            if parent == self.sessions_dir {
                let dir_name = match path.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                };
                match event.kind {
                    EventKind::Create(_) if path.is_dir() => {
                        if let Some(w) = watcher.as_mut() {
                            if let Err(e) = w.watch(path, RecursiveMode::NonRecursive) {
                                debug!(path = %path.display(), error = %e, "failed to watch new session dir");
                            }
                        }
                        if let Some(session) = interactive::load_session(path) {
                            registry.insert(dir_name, TrackedSession::new(session));
                        }
                    }
                    EventKind::Remove(_) => {
                        registry.remove(&dir_name);
                    }
                    _ => {}
                }
                continue;
            }

            // metadata.json / pid.lock written inside a session directory
            let is_session_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n == METADATA_FILE || n == PID_FILE);
            let in_session_dir = parent.parent() == Some(self.sessions_dir.as_path());
            if is_session_file
                && in_session_dir
                && matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            {
                let dir_name = match parent.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                };
                if let Some(session) = interactive::load_session(parent) {
                    registry.insert(dir_name, TrackedSession::new(session));
                }
            }
        }
    }

    /// Reconcile the registry with the directories actually on disk.
    ///
    /// The fs watcher is a latency optimisation, not a correctness
    /// foundation — a missed create or remove is recovered here, within
    /// one verification cycle. Known directories keep their in-memory
    /// entry so interrupted sessions don't flap.
    fn reconcile_disk(&self, registry: &mut HashMap<String, TrackedSession>) {
        let Ok(entries) = std::fs::read_dir(&self.sessions_dir) else {
            return;
        };
        let mut seen = HashSet::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            seen.insert(dir_name.clone());
            if !registry.contains_key(&dir_name) {
                if let Some(session) = interactive::load_session(&path) {
                    registry.insert(dir_name, TrackedSession::new(session));
                }
            }
        }
        registry.retain(|dir_name, _| seen.contains(dir_name));
    }

    /// Transition live sessions with dead PIDs to interrupted.
    fn verify_pids(&self, registry: &mut HashMap<String, TrackedSession>) {
        let now = Utc::now();
        for entry in registry.values_mut() {
            if !entry.session.status.is_live() {
                continue;
            }
            if interactive::pid_alive(entry.session.pid) {
                continue;
            }
            entry.session.status = grove_core::SessionStatus::Interrupted;
            // ended_at is set exactly once, no flapping on later ticks
            if entry.session.ended_at.is_none() {
                entry.session.ended_at = Some(now);
            }
            entry.session.last_activity = now;
            if entry.died_at.is_none() {
                entry.died_at = Some(Instant::now());
            }
        }
    }

    /// Remove on-disk directories of dead non-job sessions after the
    /// grace period. Flow-job-linked sessions are left for their own
    /// lifecycle.
    fn cleanup(&self, registry: &mut HashMap<String, TrackedSession>) {
        let expired: Vec<String> = registry
            .iter()
            .filter(|(_, entry)| {
                entry
                    .died_at
                    .is_some_and(|died| died.elapsed() >= self.cleanup_grace)
            })
            .map(|(dir, _)| dir.clone())
            .collect();

        for dir_name in expired {
            let job_linked = registry
                .get(&dir_name)
                .is_some_and(|e| e.session.job_file_path.is_some());
            if job_linked {
                if let Some(entry) = registry.get_mut(&dir_name) {
                    entry.died_at = None;
                }
                continue;
            }
            let dir = self.sessions_dir.join(&dir_name);
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!(dir = %dir.display(), error = %e, "session cleanup failed");
            }
            registry.remove(&dir_name);
        }
    }
}

#[async_trait]
impl Collector for SessionCollector {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn run(
        &self,
        shutdown: CancellationToken,
        store: Arc<Store>,
        updates: mpsc::Sender<Update>,
    ) {
        let mut interactive = interactive::load_all(&self.sessions_dir);
        let mut flow = self.scan_flow(&store);
        let mut opencode = self.scan_opencode();
        let mut last_emitted: Vec<Session> = Vec::new();

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(64);
        let mut watcher = match create_watcher(&self.sessions_dir, event_tx) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "session watcher unavailable, falling back to polling");
                None
            }
        };
        let watcher_active = watcher.is_some();

        let mut pid_tick = tokio::time::interval(self.pid_verify_interval);
        pid_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut rescan_tick = tokio::time::interval(self.rescan_interval);
        rescan_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                maybe_event = event_rx.recv(), if watcher_active => {
                    if let Some(event) = maybe_event {
                        self.handle_event(watcher.as_mut(), &mut interactive, event);
                    }
                }

                _ = pid_tick.tick() => {
                    self.reconcile_disk(&mut interactive);
                    self.verify_pids(&mut interactive);
                    self.cleanup(&mut interactive);
                }

                _ = rescan_tick.tick() => {
                    flow = self.scan_flow(&store);
                    opencode = self.scan_opencode();
                }
            }

            let live: Vec<Session> = interactive.values().map(|e| e.session.clone()).collect();
            let merged = merge_sessions(&live, &flow, &opencode);
            if merged != last_emitted {
                if updates.send(Update::sessions("session", merged.clone())).await.is_err() {
                    break;
                }
                last_emitted = merged;
            }
        }
    }
}

/// One-shot scan of every session source, merged.
///
/// This is the same work the collector does across its loops, collapsed
/// into a single pass. The local (daemon-less) client calls it directly.
pub fn discover_all_sessions(
    sessions_dir: &Path,
    discovery: &Discovery,
    opencode_dir: Option<&Path>,
) -> Vec<Session> {
    let live: Vec<Session> = interactive::load_all(sessions_dir)
        .into_values()
        .map(|t| t.session)
        .collect();
    let nodes = discovery.discover().unwrap_or_default();
    let flow = flow::scan_flow_jobs(&nodes, discovery);
    let opencode = match opencode_dir {
        Some(dir) => opencode::scan_opencode(dir, Utc::now()),
        None => Vec::new(),
    };
    merge_sessions(&live, &flow, &opencode)
}

fn create_watcher(
    root: &Path,
    tx: mpsc::Sender<notify::Event>,
) -> Result<RecommendedWatcher, notify::Error> {
    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;
    watcher.watch(root, RecursiveMode::NonRecursive)?;

    // The platform API is non-recursive: add every existing child too
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                    debug!(path = %path.display(), error = %e, "failed to watch session dir");
                }
            }
        }
    }
    Ok(watcher)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
