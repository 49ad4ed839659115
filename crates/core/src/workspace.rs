// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace nodes produced by discovery.
//!
//! A workspace is a filesystem location classified as an ecosystem (a
//! directory configured to contain other workspaces), a project, or a git
//! worktree. Nodes reference their parents by path, never by pointer, so
//! they stay copyable and serialisable; resolution goes back through the
//! discovery provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Classification assigned to a workspace by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceKind {
    /// Configured container of other workspaces
    Ecosystem,
    /// A standalone source-controlled project
    Project,
    /// A git worktree of a parent project
    Worktree,
    /// A worktree of a sub-project that itself lives inside an ecosystem
    /// worktree (the deepest nesting discovery produces)
    EcosystemWorktreeSubProjectWorktree,
}

impl fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceKind::Ecosystem => write!(f, "ecosystem"),
            WorkspaceKind::Project => write!(f, "project"),
            WorkspaceKind::Worktree => write!(f, "worktree"),
            WorkspaceKind::EcosystemWorktreeSubProjectWorktree => {
                write!(f, "ecosystem_worktree_sub_project_worktree")
            }
        }
    }
}

/// A discovered workspace.
///
/// The path is absolute and is the node's identity for its whole lifetime;
/// every map in the system is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceNode {
    /// Canonical absolute path (unique key)
    pub path: PathBuf,
    /// Display name (directory basename, or worktree name)
    pub name: String,
    pub kind: WorkspaceKind,
    /// Path of the owning project, for worktrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project: Option<PathBuf>,
    /// Path of the owning ecosystem, when nested under one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ecosystem: Option<PathBuf>,
}

impl WorkspaceNode {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, kind: WorkspaceKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
            parent_project: None,
            parent_ecosystem: None,
        }
    }

    /// String form of the path, used as the map key everywhere.
    pub fn path_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn is_worktree(&self) -> bool {
        matches!(
            self.kind,
            WorkspaceKind::Worktree | WorkspaceKind::EcosystemWorktreeSubProjectWorktree
        )
    }

    /// The worktree's name, when this node is one.
    pub fn worktree_name(&self) -> Option<&str> {
        self.is_worktree().then_some(self.name.as_str())
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
