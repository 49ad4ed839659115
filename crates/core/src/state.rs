// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The merged daemon state snapshot.

use crate::enriched::EnrichedWorkspace;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the daemon knows, as handed to clients.
///
/// Workspaces are keyed by canonical path, sessions by id. The store only
/// ever hands out clones of this, never aliases into its own maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub workspaces: HashMap<String, EnrichedWorkspace>,
    #[serde(default)]
    pub sessions: HashMap<String, Session>,
}

impl State {
    /// Workspaces flattened and sorted by path for stable output.
    pub fn workspace_list(&self) -> Vec<EnrichedWorkspace> {
        let mut list: Vec<_> = self.workspaces.values().cloned().collect();
        list.sort_by(|a, b| a.node.path.cmp(&b.node.path));
        list
    }

    /// Sessions flattened and sorted by id.
    pub fn session_list(&self) -> Vec<Session> {
        let mut list: Vec<_> = self.sessions.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }
}
