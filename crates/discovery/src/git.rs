// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git status collection via the `git` binary.
//!
//! One `git status --porcelain=v2 --branch` call per workspace; the
//! parsing is a pure function so the subprocess stays at the edge.

use crate::discover::DiscoveryError;
use grove_core::GitStatus;
use std::path::Path;
use tokio::process::Command;

/// Run git status for one workspace.
pub async fn collect_status(path: &Path) -> Result<GitStatus, DiscoveryError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(["status", "--porcelain=v2", "--branch"])
        .output()
        .await?;

    if !output.status.success() {
        return Err(DiscoveryError::Git(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(parse_porcelain(&String::from_utf8_lossy(&output.stdout)))
}

/// Fetch the `origin` remote URL, if any.
pub async fn remote_url(path: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(["remote", "get-url", "origin"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!url.is_empty()).then_some(url)
}

/// Parse `git status --porcelain=v2 --branch` output.
pub fn parse_porcelain(text: &str) -> GitStatus {
    let mut status = GitStatus::default();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("# branch.head ") {
            status.branch = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("# branch.ab ") {
            for part in rest.split_whitespace() {
                if let Some(n) = part.strip_prefix('+') {
                    status.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = part.strip_prefix('-') {
                    status.behind = n.parse().unwrap_or(0);
                }
            }
        } else if line.starts_with("1 ") || line.starts_with("2 ") {
            // `<1|2> XY ...` — X is the staged column, Y the worktree column
            let mut xy = line.split_whitespace().nth(1).unwrap_or("..").chars();
            let x = xy.next().unwrap_or('.');
            let y = xy.next().unwrap_or('.');
            if x != '.' {
                status.staged += 1;
            }
            if y != '.' {
                status.modified += 1;
            }
        } else if line.starts_with("? ") {
            status.untracked += 1;
        }
    }

    status.dirty = status.staged > 0 || status.modified > 0 || status.untracked > 0;
    status
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
