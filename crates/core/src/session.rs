// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent sessions and the cross-source merge rules.
//!
//! Sessions come from three disjoint sources: interactive sessions tracked
//! on disk, flow jobs parsed from plan/chat markdown, and OpenCode's own
//! session store. The merged registry deduplicates by id with priority
//! interactive > flow-job > opencode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Which source a session was observed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Interactive,
    FlowJob,
    Opencode,
}

impl SessionKind {
    /// Merge priority; higher wins when the same id appears twice.
    fn priority(self) -> u8 {
        match self {
            SessionKind::Interactive => 2,
            SessionKind::FlowJob => 1,
            SessionKind::Opencode => 0,
        }
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Idle,
    PendingUser,
    Interrupted,
    Completed,
    Pending,
}

impl SessionStatus {
    /// True for statuses that imply a live process worth PID-verifying.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Running | SessionStatus::Idle | SessionStatus::PendingUser
        )
    }
}

/// One agent session in the merged registry.
///
/// `(kind, id)` is unique per source; after the merge, `id` alone is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    #[serde(default)]
    pub provider: String,
    /// 0 when the source has no process to track
    #[serde(default)]
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub user: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_file_path: Option<PathBuf>,
}

impl Session {
    /// Minimal constructor; callers fill in the optional attributes.
    pub fn new(
        id: impl Into<String>,
        kind: SessionKind,
        status: SessionStatus,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            provider: String::new(),
            pid: 0,
            working_directory: None,
            repo: String::new(),
            branch: String::new(),
            user: String::new(),
            status,
            started_at,
            last_activity: started_at,
            ended_at: None,
            claude_session_id: None,
            transcript_path: None,
            job_title: None,
            plan_name: None,
            job_file_path: None,
        }
    }
}

/// Merge the three per-source registries into one list, deduplicated by id.
///
/// The higher-priority entry wins the slot; fields missing on the winner
/// are filled from the loser (currently `provider`, plus job metadata when
/// an interactive session shadows its flow job). Output is sorted by id so
/// emissions are deterministic.
pub fn merge_sessions(
    interactive: &[Session],
    flow: &[Session],
    opencode: &[Session],
) -> Vec<Session> {
    let mut merged: HashMap<String, Session> = HashMap::new();

    // Lowest priority first; later inserts win the slot but inherit
    // whatever the displaced entry had that they lack.
    for session in opencode.iter().chain(flow).chain(interactive) {
        match merged.remove(&session.id) {
            None => {
                merged.insert(session.id.clone(), session.clone());
            }
            Some(existing) => {
                let (mut winner, loser) =
                    if session.kind.priority() >= existing.kind.priority() {
                        (session.clone(), existing)
                    } else {
                        (existing, session.clone())
                    };
                fill_missing(&mut winner, &loser);
                merged.insert(winner.id.clone(), winner);
            }
        }
    }

    let mut out: Vec<Session> = merged.into_values().collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

fn fill_missing(winner: &mut Session, loser: &Session) {
    if winner.provider.is_empty() {
        winner.provider = loser.provider.clone();
    }
    if winner.job_title.is_none() {
        winner.job_title = loser.job_title.clone();
    }
    if winner.plan_name.is_none() {
        winner.plan_name = loser.plan_name.clone();
    }
    if winner.job_file_path.is_none() {
        winner.job_file_path = loser.job_file_path.clone();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
