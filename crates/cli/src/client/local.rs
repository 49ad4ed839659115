// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fallback client.
//!
//! Runs the same discovery and enrichment routines the daemon's
//! collectors use, synchronously, against the same configuration. The
//! results match a freshly started daemon's first ticks.

use super::ClientError;
use chrono::Utc;
use grove_core::{EnrichedWorkspace, NoteCounts, PlanStats, Session, State, WorkspaceNode};
use grove_daemon::collectors::session::discover_all_sessions;
use grove_daemon::RunningConfig;
use grove_discovery::{fetch_note_counts, fetch_plan_stats, git, Discovery, GroveConfig};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct LocalClient {
    discovery: Discovery,
    config: GroveConfig,
    sessions_dir: PathBuf,
}

impl LocalClient {
    pub fn new() -> Result<Self, ClientError> {
        let config_dir =
            grove_daemon::env::config_dir().map_err(|_| ClientError::NoStateDir)?;
        let state_dir = grove_daemon::env::state_dir().map_err(|_| ClientError::NoStateDir)?;
        let config = GroveConfig::load(&config_dir);
        let sessions_dir = config
            .sessions_dir
            .clone()
            .unwrap_or_else(|| state_dir.join("sessions"));
        Ok(Self {
            discovery: Discovery::new(config.roots.clone()),
            config,
            sessions_dir,
        })
    }

    pub fn get_workspaces(&self) -> Result<Vec<WorkspaceNode>, ClientError> {
        Ok(self.discovery.discover()?)
    }

    pub async fn get_enriched_workspaces(&self) -> Result<Vec<EnrichedWorkspace>, ClientError> {
        let nodes = self.discovery.discover()?;
        let plans = fetch_plan_stats(&nodes);
        let notes = fetch_note_counts(&nodes);

        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut ws = EnrichedWorkspace::new(node);
            ws.plans = plans.get(&ws.path_key()).cloned();
            ws.notes = notes.get(&ws.node.name).cloned();
            if let Ok(status) = git::collect_status(&ws.node.path).await {
                ws.git = Some(status);
            }
            out.push(ws);
        }
        Ok(out)
    }

    pub fn get_sessions(&self) -> Result<Vec<Session>, ClientError> {
        Ok(discover_all_sessions(
            &self.sessions_dir,
            &self.discovery,
            grove_daemon::env::opencode_storage_dir().as_deref(),
        ))
    }

    pub fn get_plan_stats(&self) -> Result<HashMap<String, PlanStats>, ClientError> {
        let nodes = self.discovery.discover()?;
        Ok(fetch_plan_stats(&nodes))
    }

    pub fn get_note_counts(&self) -> Result<HashMap<String, NoteCounts>, ClientError> {
        let nodes = self.discovery.discover()?;
        Ok(fetch_note_counts(&nodes))
    }

    /// Effective local configuration; `started_at` is simply "now" since
    /// there is no daemon lifetime to report.
    pub fn get_config(&self) -> RunningConfig {
        RunningConfig {
            intervals: self.config.intervals.clone(),
            sessions_dir: self.sessions_dir.clone(),
            started_at: Utc::now(),
        }
    }

    pub async fn refresh(&self) -> Result<State, ClientError> {
        let workspaces = self
            .get_enriched_workspaces()
            .await?
            .into_iter()
            .map(|w| (w.path_key(), w))
            .collect();
        let sessions = self
            .get_sessions()?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        Ok(State {
            workspaces,
            sessions,
        })
    }
}

impl From<grove_discovery::DiscoveryError> for ClientError {
    fn from(e: grove_discovery::DiscoveryError) -> Self {
        match e {
            grove_discovery::DiscoveryError::Io(io) => ClientError::Io(io),
            grove_discovery::DiscoveryError::Git(msg) => {
                ClientError::Io(std::io::Error::other(msg))
            }
        }
    }
}
