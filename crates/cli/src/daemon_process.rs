// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process control: start, stop, status.

use anyhow::{bail, Context};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long to wait for the daemon to come up or go down.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn socket_path() -> anyhow::Result<PathBuf> {
    let dir = grove_daemon::env::runtime_dir().context("could not resolve runtime directory")?;
    Ok(dir.join(grove_daemon::lifecycle::SOCKET_FILE))
}

fn pid_path() -> anyhow::Result<PathBuf> {
    let dir = grove_daemon::env::runtime_dir().context("could not resolve runtime directory")?;
    Ok(dir.join(grove_daemon::lifecycle::PID_FILE))
}

/// The groved binary: sibling of the current executable, else $PATH.
fn groved_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("groved");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("groved")
}

pub fn start() -> anyhow::Result<()> {
    let socket = socket_path()?;
    if socket.exists() {
        println!("groved already running");
        return Ok(());
    }

    std::process::Command::new(groved_binary())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("failed to spawn groved")?;

    let started = Instant::now();
    while started.elapsed() < WAIT_TIMEOUT {
        if socket.exists() {
            println!("groved started");
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    bail!("timed out waiting for groved to start");
}

pub fn stop() -> anyhow::Result<()> {
    let pid_file = pid_path()?;
    let raw = match std::fs::read_to_string(&pid_file) {
        Ok(raw) => raw,
        Err(_) => {
            println!("groved not running");
            return Ok(());
        }
    };
    let pid: i32 = raw.trim().parse().context("invalid pid file")?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).context("failed to signal groved")?;

    let socket = socket_path()?;
    let started = Instant::now();
    while started.elapsed() < WAIT_TIMEOUT {
        if !socket.exists() {
            println!("groved stopped");
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    bail!("groved did not stop within {}s", WAIT_TIMEOUT.as_secs());
}

pub fn status() -> anyhow::Result<()> {
    let socket = socket_path()?;
    if !socket.exists() {
        println!("groved: not running");
        return Ok(());
    }
    match std::fs::read_to_string(pid_path()?) {
        Ok(pid) => println!("groved: running (pid {})", pid.trim()),
        Err(_) => println!("groved: socket present, pid unknown"),
    }
    Ok(())
}
