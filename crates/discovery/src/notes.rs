// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Note counting across workspaces.
//!
//! One coarse call counts every note in one pass; the result is keyed by
//! workspace *name*, which clients rely on. Notes live under
//! `<workspace>/notes/<group>/*.md` where group is one of the generic
//! note groups.

use grove_core::{NoteCounts, WorkspaceNode};
use std::collections::HashMap;
use std::path::Path;

/// Semantic note groups shared between note counting and flow-job
/// worktree resolution.
pub const GENERIC_NOTE_GROUPS: &[&str] = &[
    "inbox",
    "current",
    "llm",
    "learn",
    "daily",
    "issues",
    "architecture",
    "todos",
    "quick",
    "archive",
    "prompts",
    "blog",
];

/// Count notes for every workspace, keyed by workspace name.
///
/// Workspaces without a notes directory are simply absent from the map.
pub fn fetch_note_counts(nodes: &[WorkspaceNode]) -> HashMap<String, NoteCounts> {
    let mut out = HashMap::new();
    for node in nodes {
        let notes_dir = node.path.join("notes");
        if !notes_dir.is_dir() {
            continue;
        }
        let mut counts = NoteCounts::new();
        for group in GENERIC_NOTE_GROUPS {
            let count = count_markdown(&notes_dir.join(group));
            if count > 0 {
                counts.insert((*group).to_string(), count);
            }
        }
        if !counts.is_empty() {
            out.insert(node.name.clone(), counts);
        }
    }
    out
}

fn count_markdown(dir: &Path) -> u32 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "md"))
        .count() as u32
}

#[cfg(test)]
#[path = "notes_tests.rs"]
mod tests;
