// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use grove_core::{WorkspaceKind, WorkspaceNode};

fn write_plan(dir: &Path, name: &str, status: &str, updated: &str) {
    std::fs::write(
        dir.join(format!("{name}.md")),
        format!("---\ntitle: {name}\nstatus: {status}\nupdated_at: {updated}\n---\n"),
    )
    .unwrap();
}

fn workspace(dir: &Path) -> WorkspaceNode {
    WorkspaceNode::new(dir, "w", WorkspaceKind::Project)
}

#[test]
fn stats_are_keyed_by_path() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    write_plan(&plans, "alpha", "done", "2024-01-01T00:00:00Z");

    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    let key = dir.path().to_string_lossy().into_owned();
    assert_eq!(stats[&key].total, 1);
    assert_eq!(stats[&key].by_status["done"], 1);
}

#[test]
fn newest_active_plan_wins() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    write_plan(&plans, "older", "running", "2024-01-01T00:00:00Z");
    write_plan(&plans, "newer", "idle", "2024-06-01T00:00:00Z");
    write_plan(&plans, "finished", "done", "2024-12-01T00:00:00Z");

    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    let key = dir.path().to_string_lossy().into_owned();
    assert_eq!(stats[&key].active_plan.as_deref(), Some("newer"));
    assert_eq!(stats[&key].active_status.as_deref(), Some("idle"));
}

#[test]
fn no_active_plan_leaves_fields_unset() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    write_plan(&plans, "done-1", "done", "2024-01-01T00:00:00Z");

    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    let key = dir.path().to_string_lossy().into_owned();
    assert!(stats[&key].active_plan.is_none());
}

#[test]
fn files_without_frontmatter_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    std::fs::write(plans.join("README.md"), "# plans\n").unwrap();

    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    assert!(stats.is_empty());
}

#[test]
fn workspace_without_plans_dir_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    assert!(stats.is_empty());
}

#[test]
fn missing_status_counts_as_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    std::fs::write(plans.join("p.md"), "---\ntitle: p\n---\n").unwrap();

    let stats = fetch_plan_stats(&[workspace(dir.path())]);
    let key = dir.path().to_string_lossy().into_owned();
    assert_eq!(stats[&key].by_status["unknown"], 1);
}
