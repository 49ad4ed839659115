// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record for a tracked interactive session.
//!
//! A session directory is tracked iff it holds both `metadata.json`
//! (this document) and `pid.lock` (an ASCII PID). Everything else in the
//! directory is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the JSON metadata document inside a session directory.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the PID lock inside a session directory.
pub const PID_FILE: &str = "pid.lock";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pid file: {0:?}")]
    InvalidPid(String),
}

/// JSON document written by the session launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_session_id: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub pid: u32,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub user: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_file_path: Option<PathBuf>,
}

impl SessionMetadata {
    /// Read and parse `metadata.json` from a session directory.
    pub fn load(dir: &Path) -> Result<Self, MetadataError> {
        let raw = std::fs::read_to_string(dir.join(METADATA_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Read and parse `pid.lock` from a session directory.
///
/// A trailing newline is tolerated; anything else non-numeric is an error.
pub fn read_pid_file(dir: &Path) -> Result<u32, MetadataError> {
    let raw = std::fs::read_to_string(dir.join(PID_FILE))?;
    let trimmed = raw.trim();
    trimmed
        .parse::<u32>()
        .map_err(|_| MetadataError::InvalidPid(trimmed.to_string()))
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
