// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enrichment facets layered onto discovered workspaces.
//!
//! Each facet is owned by exactly one collector; all facets are optional.
//! Because the store replaces the workspaces map wholesale, a collector
//! that refreshes one facet must carry every other facet forward via
//! [`EnrichedWorkspace::copy_facets_from`].

use crate::workspace::WorkspaceNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Git working-tree status for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    pub branch: String,
    pub dirty: bool,
    #[serde(default)]
    pub ahead: u32,
    #[serde(default)]
    pub behind: u32,
    #[serde(default)]
    pub staged: u32,
    #[serde(default)]
    pub modified: u32,
    #[serde(default)]
    pub untracked: u32,
}

/// Note counts keyed by semantic category (inbox, daily, issues, ...).
pub type NoteCounts = BTreeMap<String, u32>;

/// Aggregate plan statistics for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total: u32,
    /// Totals by plan status
    #[serde(default)]
    pub by_status: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_status: Option<String>,
}

/// Release position relative to the latest tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_tag: Option<String>,
    #[serde(default)]
    pub commits_ahead: u32,
}

/// Installed binary status for tool workspaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dev: bool,
}

/// Context (cx) token statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CxStats {
    #[serde(default)]
    pub files: u32,
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub bytes: u64,
}

/// A workspace plus its optional runtime facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedWorkspace {
    #[serde(flatten)]
    pub node: WorkspaceNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NoteCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plans: Option<PlanStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cx: Option<CxStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl EnrichedWorkspace {
    pub fn new(node: WorkspaceNode) -> Self {
        Self {
            node,
            git: None,
            notes: None,
            plans: None,
            release: None,
            binary: None,
            cx: None,
            remote_url: None,
        }
    }

    pub fn path_key(&self) -> String {
        self.node.path_key()
    }

    /// Carry every enrichment facet forward from a previous incarnation of
    /// the same workspace. The node itself is not touched.
    pub fn copy_facets_from(&mut self, prev: &EnrichedWorkspace) {
        self.git = prev.git.clone();
        self.notes = prev.notes.clone();
        self.plans = prev.plans.clone();
        self.release = prev.release.clone();
        self.binary = prev.binary.clone();
        self.cx = prev.cx.clone();
        self.remote_url = prev.remote_url.clone();
    }
}

#[cfg(test)]
#[path = "enriched_tests.rs"]
mod tests;
