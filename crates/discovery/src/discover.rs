// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace discovery under the configured roots.
//!
//! Each root is reported as an ecosystem and scanned two levels deep.
//! Classification is purely filesystem-shaped: a `.git` directory makes a
//! project, a `.git` file (a worktree pointer) makes a worktree whose
//! parent project is recovered from the `gitdir:` line. Unreadable
//! children are skipped; an unreadable root fails the whole scan so the
//! caller can keep its previous view.

use grove_core::{WorkspaceKind, WorkspaceNode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git error: {0}")]
    Git(String),
}

/// The discovery provider: owns the configured roots.
#[derive(Debug, Clone)]
pub struct Discovery {
    roots: Vec<PathBuf>,
}

impl Discovery {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Scan every root and return the discovered workspace nodes.
    pub fn discover(&self) -> Result<Vec<WorkspaceNode>, DiscoveryError> {
        let mut nodes = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "skipping missing root");
                continue;
            }
            self.scan_root(root, &mut nodes)?;
        }
        Ok(nodes)
    }

    /// Find a node by exact path.
    pub fn find_by_path<'a>(
        &self,
        nodes: &'a [WorkspaceNode],
        path: &Path,
    ) -> Option<&'a WorkspaceNode> {
        nodes.iter().find(|n| n.path == path)
    }

    /// Find the sibling worktree of `owner`'s project with the given name.
    pub fn find_by_worktree<'a>(
        &self,
        nodes: &'a [WorkspaceNode],
        owner: &WorkspaceNode,
        name: &str,
    ) -> Option<&'a WorkspaceNode> {
        let project = owner
            .parent_project
            .clone()
            .unwrap_or_else(|| owner.path.clone());
        nodes.iter().find(|n| {
            n.is_worktree() && n.name == name && n.parent_project.as_deref() == Some(&*project)
        })
    }

    fn scan_root(
        &self,
        root: &Path,
        nodes: &mut Vec<WorkspaceNode>,
    ) -> Result<(), DiscoveryError> {
        let mut ecosystem = WorkspaceNode::new(root, dir_name(root), WorkspaceKind::Ecosystem);
        ecosystem.parent_ecosystem = None;
        nodes.push(ecosystem);

        for child in sorted_dirs(root)? {
            match classify(&child) {
                Some(mut node) => {
                    node.parent_ecosystem = Some(root.to_path_buf());
                    nodes.push(node);
                }
                None => {
                    // A plain grouping directory: scan one more level
                    let Ok(grandchildren) = sorted_dirs(&child) else {
                        continue;
                    };
                    for grandchild in grandchildren {
                        if let Some(mut node) = classify(&grandchild) {
                            node.parent_ecosystem = Some(root.to_path_buf());
                            nodes.push(node);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Classify a directory as project or worktree, or neither.
fn classify(path: &Path) -> Option<WorkspaceNode> {
    let git = path.join(".git");
    if git.is_dir() {
        return Some(WorkspaceNode::new(
            path,
            dir_name(path),
            WorkspaceKind::Project,
        ));
    }
    if git.is_file() {
        let parent_project = worktree_parent(&git);
        let kind = match &parent_project {
            // A worktree whose owning project is itself checked out as a
            // worktree inside an ecosystem
            Some(owner) if owner.join(".git").is_file() => {
                WorkspaceKind::EcosystemWorktreeSubProjectWorktree
            }
            _ => WorkspaceKind::Worktree,
        };
        let mut node = WorkspaceNode::new(path, dir_name(path), kind);
        node.parent_project = parent_project;
        return Some(node);
    }
    None
}

/// Recover the owning project path from a worktree's `.git` pointer file.
///
/// The file contains `gitdir: <project>/.git/worktrees/<name>`.
fn worktree_parent(git_file: &Path) -> Option<PathBuf> {
    let raw = std::fs::read_to_string(git_file).ok()?;
    let gitdir = raw.strip_prefix("gitdir:")?.trim();
    let gitdir = Path::new(gitdir);
    // <project>/.git/worktrees/<name> → <project>
    let worktrees = gitdir.parent()?;
    if worktrees.file_name()? != "worktrees" {
        return None;
    }
    let dot_git = worktrees.parent()?;
    if dot_git.file_name()? != ".git" {
        return None;
    }
    dot_git.parent().map(Path::to_path_buf)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn sorted_dirs(path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
