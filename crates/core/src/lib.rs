// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! grove-core: data model for the grove workspace daemon.
//!
//! Holds the types shared between the daemon, the discovery library, and
//! the client: workspace nodes and their enrichment facets, agent sessions
//! and their on-disk metadata, and the update messages that flow from
//! collectors through the store to subscribers.

pub mod enriched;
pub mod metadata;
pub mod session;
pub mod state;
pub mod update;
pub mod workspace;

pub use enriched::{
    BinaryStatus, CxStats, EnrichedWorkspace, GitStatus, NoteCounts, PlanStats, ReleaseInfo,
};
pub use metadata::{MetadataError, SessionMetadata};
pub use session::{merge_sessions, Session, SessionKind, SessionStatus};
pub use state::State;
pub use update::{StateUpdate, Update, UpdatePayload, UpdateType};
pub use workspace::{WorkspaceKind, WorkspaceNode};
