// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update messages from collectors to the engine, and their wire form.
//!
//! An [`Update`] is constructed by a collector, consumed once by the
//! engine (which applies it to the store), broadcast best-effort to
//! subscribers, then discarded. [`StateUpdate`] is the JSON frame the SSE
//! stream carries; the daemon serialises one per broadcast and clients
//! parse them back.

use crate::enriched::EnrichedWorkspace;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload variants carried by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    /// Full replacement workspaces map, keyed by path
    Workspaces(HashMap<String, EnrichedWorkspace>),
    /// Full merged session list
    Sessions(Vec<Session>),
    /// Replacement focus set
    Focus(Vec<String>),
    /// Config file basename that changed
    ConfigReload(String),
}

/// A typed message from one collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Collector name, for observability
    pub source: String,
    /// How many items the emitting scan covered
    pub scanned: usize,
    pub payload: UpdatePayload,
}

impl Update {
    pub fn workspaces(
        source: impl Into<String>,
        scanned: usize,
        workspaces: HashMap<String, EnrichedWorkspace>,
    ) -> Self {
        Self {
            source: source.into(),
            scanned,
            payload: UpdatePayload::Workspaces(workspaces),
        }
    }

    pub fn sessions(source: impl Into<String>, sessions: Vec<Session>) -> Self {
        Self {
            source: source.into(),
            scanned: sessions.len(),
            payload: UpdatePayload::Sessions(sessions),
        }
    }

    pub fn focus(source: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            source: source.into(),
            scanned: paths.len(),
            payload: UpdatePayload::Focus(paths),
        }
    }

    pub fn config_reload(file: impl Into<String>) -> Self {
        Self {
            source: "config".into(),
            scanned: 0,
            payload: UpdatePayload::ConfigReload(file.into()),
        }
    }
}

/// Discriminant carried on the wire as `update_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// Synthesised snapshot sent once per new stream
    Initial,
    Workspaces,
    Sessions,
    Focus,
    ConfigReload,
}

/// One SSE frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub update_type: UpdateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<Vec<EnrichedWorkspace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<Session>>,
}

impl StateUpdate {
    /// The frame synthesised for a freshly connected stream when the
    /// workspaces map is already populated.
    pub fn initial(workspaces: Vec<EnrichedWorkspace>) -> Self {
        Self {
            update_type: UpdateType::Initial,
            source: None,
            scanned: Some(workspaces.len()),
            config_file: None,
            workspaces: Some(workspaces),
            sessions: None,
        }
    }
}

impl From<&Update> for StateUpdate {
    fn from(update: &Update) -> Self {
        let mut frame = Self {
            update_type: UpdateType::ConfigReload,
            source: Some(update.source.clone()),
            scanned: Some(update.scanned),
            config_file: None,
            workspaces: None,
            sessions: None,
        };
        match &update.payload {
            UpdatePayload::Workspaces(map) => {
                frame.update_type = UpdateType::Workspaces;
                let mut list: Vec<_> = map.values().cloned().collect();
                list.sort_by(|a, b| a.node.path.cmp(&b.node.path));
                frame.workspaces = Some(list);
            }
            UpdatePayload::Sessions(list) => {
                frame.update_type = UpdateType::Sessions;
                frame.sessions = Some(list.clone());
            }
            UpdatePayload::Focus(_) => {
                frame.update_type = UpdateType::Focus;
            }
            UpdatePayload::ConfigReload(file) => {
                frame.update_type = UpdateType::ConfigReload;
                frame.config_file = Some(file.clone());
            }
        }
        frame
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
