// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenCode session discovery.
//!
//! OpenCode keeps one JSON file per session under its own storage root:
//! `storage/project/*.json` maps project ids to worktree paths and
//! `storage/session/<project_hash>/ses_*.json` holds the sessions, with
//! millisecond epoch timestamps. Only recently-updated sessions are
//! surfaced; the rest is history.

use chrono::{DateTime, Duration, TimeZone, Utc};
use grove_core::{Session, SessionKind, SessionStatus};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sessions idle longer than this are not surfaced.
const RECENCY_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
struct OpencodeProject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    worktree: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct OpencodeTime {
    #[serde(default)]
    created: i64,
    #[serde(default)]
    updated: i64,
}

#[derive(Debug, Deserialize)]
struct OpencodeSession {
    id: String,
    #[serde(default, rename = "projectID")]
    project_id: Option<String>,
    #[serde(default)]
    directory: Option<PathBuf>,
    #[serde(default)]
    title: Option<String>,
    time: OpencodeTime,
}

/// Scan the OpenCode storage root for recent sessions.
pub fn scan_opencode(storage: &Path, now: DateTime<Utc>) -> Vec<Session> {
    let projects = load_projects(&storage.join("project"));
    let mut sessions = Vec::new();

    let session_root = storage.join("session");
    let Ok(project_dirs) = std::fs::read_dir(&session_root) else {
        return sessions;
    };
    for project_dir in project_dirs.filter_map(|e| e.ok()) {
        let dir = project_dir.path();
        if !dir.is_dir() {
            continue;
        }
        let Ok(files) = std::fs::read_dir(&dir) else {
            continue;
        };
        for file in files.filter_map(|e| e.ok()) {
            let path = file.path();
            let name = file.file_name().to_string_lossy().into_owned();
            if !name.starts_with("ses_") || path.extension().is_none_or(|x| x != "json") {
                continue;
            }
            match load_session_file(&path, &projects, now) {
                Some(session) => sessions.push(session),
                None => debug!(path = %path.display(), "skipping opencode session file"),
            }
        }
    }
    sessions
}

fn load_projects(dir: &Path) -> HashMap<String, PathBuf> {
    let mut out = HashMap::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().is_none_or(|x| x != "json") {
            continue;
        }
        let Ok(raw) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(project) = serde_json::from_str::<OpencodeProject>(&raw) else {
            continue;
        };
        let id = project.id.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        if let Some(worktree) = project.worktree {
            out.insert(id, worktree);
        }
    }
    out
}

fn load_session_file(
    path: &Path,
    projects: &HashMap<String, PathBuf>,
    now: DateTime<Utc>,
) -> Option<Session> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: OpencodeSession = serde_json::from_str(&raw).ok()?;

    let started = millis_to_utc(parsed.time.created)?;
    let updated = millis_to_utc(parsed.time.updated).unwrap_or(started);
    if now - updated > Duration::hours(RECENCY_HOURS) {
        return None;
    }

    let directory = parsed.directory.or_else(|| {
        parsed
            .project_id
            .as_ref()
            .and_then(|id| projects.get(id).cloned())
    });

    let mut session = Session::new(parsed.id, SessionKind::Opencode, SessionStatus::Idle, started);
    session.provider = "opencode".to_string();
    session.working_directory = directory;
    session.last_activity = updated;
    session.job_title = parsed.title;
    Some(session)
}

fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
#[path = "opencode_tests.rs"]
mod tests;
