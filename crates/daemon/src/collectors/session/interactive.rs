// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive session loading and PID liveness.
//!
//! An interactive session is a directory under the sessions dir holding
//! `pid.lock` and `metadata.json`. It is tracked iff both files exist and
//! the PID file parses; anything less is not yet a session.

use chrono::Utc;
use grove_core::metadata::{read_pid_file, SessionMetadata};
use grove_core::{Session, SessionKind, SessionStatus};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// A tracked interactive session plus its cleanup bookkeeping.
pub(crate) struct TrackedSession {
    pub session: Session,
    /// When the PID was first observed dead; drives the cleanup grace
    pub died_at: Option<Instant>,
}

impl TrackedSession {
    pub fn new(session: Session) -> Self {
        // A session already dead at load goes straight into the cleanup
        // grace window
        let died_at = (!session.status.is_live()).then(Instant::now);
        Self { session, died_at }
    }
}

/// Signal-0 liveness probe.
pub fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Load one session from its directory.
///
/// Returns `None` when either file is missing or unparseable — the
/// directory simply isn't tracked yet.
pub fn load_session(dir: &Path) -> Option<Session> {
    let pid = read_pid_file(dir).ok()?;
    let meta = SessionMetadata::load(dir).ok()?;
    let dir_name = dir.file_name()?.to_string_lossy().into_owned();

    let id = if meta.session_id.is_empty() {
        dir_name.clone()
    } else {
        meta.session_id.clone()
    };
    let claude_session_id = meta
        .claude_session_id
        .clone()
        .unwrap_or_else(|| dir_name.clone());

    let alive = pid_alive(pid);
    let now = Utc::now();
    let status = if alive {
        SessionStatus::Running
    } else {
        SessionStatus::Interrupted
    };

    let mut session = Session::new(id, SessionKind::Interactive, status, meta.started_at);
    session.pid = pid;
    session.provider = meta.provider;
    session.repo = meta.repo;
    session.branch = meta.branch;
    session.user = meta.user;
    session.working_directory = meta.working_directory;
    session.claude_session_id = Some(claude_session_id);
    session.transcript_path = meta.transcript_path;
    session.job_title = meta.job_title;
    session.plan_name = meta.plan_name;
    session.job_file_path = meta.job_file_path;
    if alive {
        session.last_activity = meta.started_at;
        session.ended_at = None;
    } else {
        session.last_activity = now;
        session.ended_at = Some(now);
    }
    Some(session)
}

/// Load every tracked session under the sessions directory, keyed by
/// directory name.
pub(crate) fn load_all(sessions_dir: &Path) -> HashMap<String, TrackedSession> {
    let mut out = HashMap::new();
    let Ok(entries) = std::fs::read_dir(sessions_dir) else {
        return out;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match load_session(&path) {
            Some(session) => {
                let dir_name = entry.file_name().to_string_lossy().into_owned();
                out.insert(dir_name, TrackedSession::new(session));
            }
            None => debug!(dir = %path.display(), "incomplete session directory, skipping"),
        }
    }
    out
}

#[cfg(test)]
#[path = "interactive_tests.rs"]
mod tests;
