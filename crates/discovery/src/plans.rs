// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan statistics across workspaces.
//!
//! Plans are markdown files with frontmatter under `<workspace>/plans/`.
//! The result map is keyed by workspace *path* (unlike note counts, which
//! key by name) — clients rely on both keying choices.

use crate::frontmatter::parse_frontmatter;
use chrono::{DateTime, Utc};
use grove_core::{PlanStats, WorkspaceNode};
use std::collections::HashMap;
use std::path::Path;

/// Statuses that make a plan the workspace's "active" plan.
const ACTIVE_STATUSES: &[&str] = &["running", "pending_user", "idle"];

/// Compute plan statistics for every workspace, keyed by workspace path.
pub fn fetch_plan_stats(nodes: &[WorkspaceNode]) -> HashMap<String, PlanStats> {
    let mut out = HashMap::new();
    for node in nodes {
        let plans_dir = node.path.join("plans");
        if !plans_dir.is_dir() {
            continue;
        }
        if let Some(stats) = scan_plans(&plans_dir) {
            out.insert(node.path_key(), stats);
        }
    }
    out
}

fn scan_plans(dir: &Path) -> Option<PlanStats> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut stats = PlanStats::default();
    let mut latest_active: Option<(DateTime<Utc>, String, String)> = None;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().is_none_or(|x| x != "md") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Some(fm) = parse_frontmatter(&content) else {
            continue;
        };

        stats.total += 1;
        let status = fm.status.clone().unwrap_or_else(|| "unknown".to_string());
        *stats.by_status.entry(status.clone()).or_insert(0) += 1;

        if ACTIVE_STATUSES.contains(&status.as_str()) {
            let name = fm
                .title
                .clone()
                .or_else(|| fm.id.clone())
                .unwrap_or_else(|| file_stem(&path));
            let updated = fm
                .updated_at_utc()
                .or_else(|| fm.start_time_utc())
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let newer = latest_active
                .as_ref()
                .is_none_or(|(when, _, _)| updated >= *when);
            if newer {
                latest_active = Some((updated, name, status));
            }
        }
    }

    if stats.total == 0 {
        return None;
    }
    if let Some((_, name, status)) = latest_active {
        stats.active_plan = Some(name);
        stats.active_status = Some(status);
    }
    Some(stats)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "plans_tests.rs"]
mod tests;
