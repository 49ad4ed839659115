// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! grove: CLI for the grove workspace daemon.
//!
//! Every read command goes through the transparent client, so it works
//! with or without a running daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "grove", version, about = "Live workspace and session view")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon status and state summary
    Status,
    /// List workspaces with their enrichment
    Workspaces {
        /// Emit raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List active agent sessions
    Sessions {
        /// Emit raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set the focus set
    Focus {
        /// Workspace paths to focus; empty prints the current set
        paths: Vec<String>,
    },
    /// Follow the daemon's update stream
    Watch,
    /// Print the effective configuration
    Config,
    /// Control the daemon process
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in the background
    Start,
    /// Stop the running daemon
    Stop,
    /// Report whether the daemon is running
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Status => commands::status().await,
        Commands::Workspaces { json } => commands::workspaces(json).await,
        Commands::Sessions { json } => commands::sessions(json).await,
        Commands::Focus { paths } => commands::focus(paths).await,
        Commands::Watch => commands::watch().await,
        Commands::Config => commands::config().await,
        Commands::Daemon { action } => match action {
            DaemonAction::Start => daemon_process::start(),
            DaemonAction::Stop => daemon_process::stop(),
            DaemonAction::Status => daemon_process::status(),
        },
    }
}
