// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations over the transparent client.

use crate::client::Client;
use grove_core::{EnrichedWorkspace, Session, UpdateType};

pub async fn status() -> anyhow::Result<()> {
    let client = Client::connect().await?;
    let mode = if client.is_running() {
        "daemon"
    } else {
        "local"
    };
    let state = client.refresh().await?;
    println!("mode: {mode}");
    println!("workspaces: {}", state.workspaces.len());
    println!("sessions: {}", state.sessions.len());
    if client.is_running() {
        let focus = client.get_focus().await?;
        if !focus.is_empty() {
            println!("focus: {}", focus.join(", "));
        }
    }
    Ok(())
}

pub async fn workspaces(json: bool) -> anyhow::Result<()> {
    let client = Client::connect().await?;
    let workspaces = client.get_enriched_workspaces().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }
    for ws in &workspaces {
        println!("{}", format_workspace(ws));
    }
    Ok(())
}

fn format_workspace(ws: &EnrichedWorkspace) -> String {
    let mut line = format!("{:<12} {}", ws.node.kind.to_string(), ws.node.path.display());
    if let Some(git) = &ws.git {
        line.push_str(&format!("  [{}{}]", git.branch, if git.dirty { "*" } else { "" }));
    }
    if let Some(plans) = &ws.plans {
        if let Some(active) = &plans.active_plan {
            line.push_str(&format!("  plan:{active}"));
        }
    }
    line
}

pub async fn sessions(json: bool) -> anyhow::Result<()> {
    let client = Client::connect().await?;
    let sessions = client.get_sessions().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    if sessions.is_empty() {
        println!("no active sessions");
        return Ok(());
    }
    for session in &sessions {
        println!("{}", format_session(session));
    }
    Ok(())
}

fn format_session(session: &Session) -> String {
    let status = serde_json::to_string(&session.status)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string();
    let mut line = format!("{:<24} {:<12}", session.id, status);
    if !session.provider.is_empty() {
        line.push_str(&format!(" {}", session.provider));
    }
    if let Some(dir) = &session.working_directory {
        line.push_str(&format!("  {}", dir.display()));
    }
    line
}

pub async fn focus(paths: Vec<String>) -> anyhow::Result<()> {
    let client = Client::connect().await?;
    if paths.is_empty() {
        let focus = client.get_focus().await?;
        if focus.is_empty() {
            println!("focus: (none)");
        } else {
            for path in focus {
                println!("{path}");
            }
        }
        return Ok(());
    }
    let count = client.set_focus(&paths).await?;
    println!("focused {count} workspace(s)");
    Ok(())
}

pub async fn watch() -> anyhow::Result<()> {
    let client = Client::connect().await?;
    let mut stream = client.stream_state().await?;
    eprintln!("watching for updates (ctrl-c to stop)");
    while let Some(update) = stream.next().await {
        let kind = match update.update_type {
            UpdateType::Initial => "initial",
            UpdateType::Workspaces => "workspaces",
            UpdateType::Sessions => "sessions",
            UpdateType::Focus => "focus",
            UpdateType::ConfigReload => "config_reload",
        };
        let detail = match update.update_type {
            UpdateType::ConfigReload => update.config_file.unwrap_or_default(),
            _ => {
                let count = update
                    .workspaces
                    .as_ref()
                    .map(Vec::len)
                    .or(update.sessions.as_ref().map(Vec::len))
                    .or(update.scanned)
                    .unwrap_or(0);
                format!("{count} item(s)")
            }
        };
        let source = update.source.unwrap_or_default();
        if source.is_empty() {
            println!("{kind:<14} {detail}");
        } else {
            println!("{kind:<14} {detail}  (from {source})");
        }
    }
    eprintln!("stream closed");
    Ok(())
}

pub async fn config() -> anyhow::Result<()> {
    let client = Client::connect().await?;
    let config = client.get_config().await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
