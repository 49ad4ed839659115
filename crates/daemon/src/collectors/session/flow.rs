// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow-job scanning.
//!
//! Flow jobs are markdown files with YAML frontmatter under each
//! workspace's plan/chat/note directories. A file is a job if its
//! frontmatter `type` is a job type or its `status` is active. Archive
//! directories are skipped entirely, and `spec.md`/`README.md` are never
//! jobs regardless of frontmatter.

use super::interactive::pid_alive;
use chrono::{DateTime, Utc};
use grove_core::{Session, SessionKind, SessionStatus, WorkspaceKind, WorkspaceNode};
use grove_discovery::{parse_frontmatter, Discovery, Frontmatter, GENERIC_NOTE_GROUPS};
use std::path::{Path, PathBuf};

/// Frontmatter `type` values that mark a file as a job.
const JOB_TYPES: &[&str] = &[
    "chat",
    "oneshot",
    "agent",
    "interactive_agent",
    "headless_agent",
    "shell",
];

/// Frontmatter `status` values treated as active.
const ACTIVE_STATUSES: &[&str] = &["running", "pending_user", "idle"];

/// Job types whose liveness is not backed by a lock file.
const UNLOCKED_TYPES: &[&str] = &["chat", "interactive_agent"];

const SKIP_FILES: &[&str] = &["spec.md", "README.md"];

/// Scan every workspace for flow jobs.
pub fn scan_flow_jobs(nodes: &[WorkspaceNode], discovery: &Discovery) -> Vec<Session> {
    let mut sessions = Vec::new();
    for node in nodes {
        if node.kind == WorkspaceKind::Ecosystem {
            continue;
        }
        let mut scan_dirs = vec![node.path.join("plans"), node.path.join("chats")];
        let notes = node.path.join("notes");
        for group in GENERIC_NOTE_GROUPS {
            scan_dirs.push(notes.join(group));
        }
        for dir in scan_dirs {
            walk_jobs(&dir, node, nodes, discovery, &mut sessions);
        }
    }
    sessions
}

fn walk_jobs(
    dir: &Path,
    owner: &WorkspaceNode,
    nodes: &[WorkspaceNode],
    discovery: &Discovery,
    out: &mut Vec<Session>,
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if !is_archive_dir(&name) {
                walk_jobs(&path, owner, nodes, discovery, out);
            }
            continue;
        }
        if path.extension().is_none_or(|x| x != "md") || SKIP_FILES.contains(&name.as_str()) {
            continue;
        }
        if let Some(session) = parse_job_file(&path, owner, nodes, discovery) {
            out.push(session);
        }
    }
}

/// Archive directories (`archive`, `.archive`, `archive-*`, `.archive-*`)
/// are never scanned.
pub(crate) fn is_archive_dir(name: &str) -> bool {
    let base = name.strip_prefix('.').unwrap_or(name);
    base == "archive" || base.starts_with("archive-")
}

fn parse_job_file(
    path: &Path,
    owner: &WorkspaceNode,
    nodes: &[WorkspaceNode],
    discovery: &Discovery,
) -> Option<Session> {
    let content = std::fs::read_to_string(path).ok()?;
    let fm = parse_frontmatter(&content)?;

    let is_job_type = fm
        .job_type
        .as_deref()
        .is_some_and(|t| JOB_TYPES.contains(&t));
    let is_active = fm
        .status
        .as_deref()
        .is_some_and(|s| ACTIVE_STATUSES.contains(&s));
    if !is_job_type && !is_active {
        return None;
    }

    let resolved = resolve_worktree(path, &fm, owner, nodes, discovery);
    let mut status = parse_status(fm.status.as_deref());
    status = correct_status(path, &fm, status);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = fm.id.clone().unwrap_or_else(|| stem.clone());
    let started = fm
        .start_time_utc()
        .or_else(|| file_mtime(path))
        .unwrap_or_else(Utc::now);

    let mut session = Session::new(id, SessionKind::FlowJob, status, started);
    session.provider = fm.provider.clone().unwrap_or_default();
    session.working_directory = Some(resolved.path.clone());
    session.repo = resolved.name.clone();
    session.last_activity = fm.updated_at_utc().unwrap_or(started);
    session.job_title = fm.title.clone();
    session.plan_name = Some(stem);
    session.job_file_path = Some(path.to_path_buf());
    Some(session)
}

/// Resolve which workspace a job belongs to.
///
/// Starts from the scan directory's owner; a non-empty frontmatter
/// `worktree` redirects to the owner's sibling worktree of that name.
/// Jobs filed under a generic note group that resolve to a worktree walk
/// up to the parent project.
fn resolve_worktree<'a>(
    path: &Path,
    fm: &Frontmatter,
    owner: &'a WorkspaceNode,
    nodes: &'a [WorkspaceNode],
    discovery: &Discovery,
) -> &'a WorkspaceNode {
    let mut resolved = owner;
    if let Some(worktree) = fm.worktree.as_deref().filter(|w| !w.is_empty()) {
        if let Some(node) = discovery.find_by_worktree(nodes, owner, worktree) {
            resolved = node;
        }
    }

    let group = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    let in_generic_group =
        group.as_deref().is_some_and(|g| GENERIC_NOTE_GROUPS.contains(&g));
    if in_generic_group && resolved.is_worktree() {
        if let Some(project) = resolved
            .parent_project
            .as_deref()
            .and_then(|p| discovery.find_by_path(nodes, p))
        {
            resolved = project;
        }
    }
    resolved
}

fn parse_status(raw: Option<&str>) -> SessionStatus {
    match raw {
        Some("running") => SessionStatus::Running,
        Some("idle") => SessionStatus::Idle,
        Some("pending_user") => SessionStatus::PendingUser,
        Some("interrupted") => SessionStatus::Interrupted,
        Some("completed") | Some("done") => SessionStatus::Completed,
        _ => SessionStatus::Pending,
    }
}

/// A supposedly live lock-backed job with no live lock is interrupted.
fn correct_status(path: &Path, fm: &Frontmatter, status: SessionStatus) -> SessionStatus {
    if !matches!(status, SessionStatus::Running | SessionStatus::PendingUser) {
        return status;
    }
    if fm
        .job_type
        .as_deref()
        .is_some_and(|t| UNLOCKED_TYPES.contains(&t))
    {
        return status;
    }
    if lock_pid_alive(&lock_path(path)) {
        status
    } else {
        SessionStatus::Interrupted
    }
}

fn lock_path(job_path: &Path) -> PathBuf {
    let mut name = job_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".lock");
    job_path.with_file_name(name)
}

fn lock_pid_alive(lock: &Path) -> bool {
    let Ok(raw) = std::fs::read_to_string(lock) else {
        return false;
    };
    match raw.trim().parse::<u32>() {
        Ok(pid) => pid_alive(pid),
        Err(_) => false,
    }
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = path.metadata().ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
