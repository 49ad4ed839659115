// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered grove configuration.
//!
//! The config directory holds a top-level `grove.toml` plus optional
//! fragment files (any other `*.toml`), applied in lexical order on top of
//! the built-in defaults. A layer that fails to parse is skipped with a
//! warning; the remaining layers still apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Top-level configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "grove.toml";

/// Collector cadence settings, all in their natural units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervals {
    pub workspace_secs: u64,
    pub git_secs: u64,
    pub plan_secs: u64,
    pub note_secs: u64,
    pub session_rescan_secs: u64,
    pub pid_verify_secs: u64,
    pub config_debounce_ms: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            workspace_secs: 30,
            git_secs: 10,
            plan_secs: 60,
            note_secs: 60,
            session_rescan_secs: 10,
            pid_verify_secs: 2,
            config_debounce_ms: 100,
        }
    }
}

/// A command to run when a config section changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadHook {
    /// Dotted section path, e.g. `keys.tmux`
    pub section: String,
    pub command: Vec<String>,
}

/// Merged grove configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroveConfig {
    /// Directories scanned for workspaces
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    /// Interactive session tracking directory; resolved by the daemon
    /// when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
    #[serde(default)]
    pub intervals: Intervals,
    #[serde(default)]
    pub hooks: Vec<ReloadHook>,
}

/// One parsed layer; every field optional so fragments can be sparse.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    roots: Option<Vec<PathBuf>>,
    sessions_dir: Option<PathBuf>,
    intervals: Option<IntervalsLayer>,
    hooks: Option<Vec<ReloadHook>>,
}

#[derive(Debug, Default, Deserialize)]
struct IntervalsLayer {
    workspace_secs: Option<u64>,
    git_secs: Option<u64>,
    plan_secs: Option<u64>,
    note_secs: Option<u64>,
    session_rescan_secs: Option<u64>,
    pid_verify_secs: Option<u64>,
    config_debounce_ms: Option<u64>,
}

impl GroveConfig {
    /// Load configuration from a directory: defaults, then `grove.toml`,
    /// then every other `*.toml` fragment in lexical order.
    ///
    /// A missing directory or missing top-level file is not an error — the
    /// daemon runs fine on defaults.
    pub fn load(config_dir: &Path) -> Self {
        let mut config = GroveConfig::default();

        config.apply_file(&config_dir.join(CONFIG_FILE));

        let mut fragments: Vec<PathBuf> = match std::fs::read_dir(config_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension().is_some_and(|x| x == "toml")
                        && p.file_name().is_some_and(|n| n != CONFIG_FILE)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        fragments.sort();
        for fragment in fragments {
            config.apply_file(&fragment);
        }

        config
    }

    fn apply_file(&mut self, path: &Path) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        match toml::from_str::<ConfigLayer>(&raw) {
            Ok(layer) => self.apply_layer(layer),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparseable config layer");
            }
        }
    }

    fn apply_layer(&mut self, layer: ConfigLayer) {
        if let Some(roots) = layer.roots {
            self.roots = roots;
        }
        if let Some(dir) = layer.sessions_dir {
            self.sessions_dir = Some(dir);
        }
        if let Some(iv) = layer.intervals {
            let target = &mut self.intervals;
            if let Some(v) = iv.workspace_secs {
                target.workspace_secs = v;
            }
            if let Some(v) = iv.git_secs {
                target.git_secs = v;
            }
            if let Some(v) = iv.plan_secs {
                target.plan_secs = v;
            }
            if let Some(v) = iv.note_secs {
                target.note_secs = v;
            }
            if let Some(v) = iv.session_rescan_secs {
                target.session_rescan_secs = v;
            }
            if let Some(v) = iv.pid_verify_secs {
                target.pid_verify_secs = v;
            }
            if let Some(v) = iv.config_debounce_ms {
                target.config_debounce_ms = v;
            }
        }
        // Fragments add hooks rather than replacing the set
        if let Some(hooks) = layer.hooks {
            self.hooks.extend(hooks);
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
