// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML frontmatter parsing for flow-job and plan markdown files.
//!
//! Frontmatter is delimited by `---` lines at the top of the file.
//! Unknown keys are ignored; timestamps are kept as raw strings and
//! parsed lazily so one malformed date doesn't reject the whole document.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Recognised frontmatter keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub worktree: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Frontmatter {
    pub fn start_time_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.start_time.as_deref()?)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.updated_at.as_deref()?)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extract and parse the frontmatter block, if present.
///
/// Returns `None` when the file has no frontmatter or the YAML does not
/// parse — per the transient-failure policy, callers skip such files.
pub fn parse_frontmatter(content: &str) -> Option<Frontmatter> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    // Find the closing delimiter on its own line
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            return serde_yaml::from_str(yaml).ok();
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
