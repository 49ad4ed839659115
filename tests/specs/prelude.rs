//! Shared helpers for behavioural specs.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn groved_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("groved")
}

pub fn grove_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin("grove"));
    cmd.env("GROVE_HOME", home);
    cmd
}

/// Wait until `pred` holds, or panic after the timeout.
pub fn wait_for(what: &str, pred: impl Fn() -> bool) {
    let started = Instant::now();
    while started.elapsed() < WAIT_TIMEOUT {
        if pred() {
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    panic!("timed out waiting for {what}");
}

/// A running daemon that is terminated (hard) when the guard drops.
pub struct DaemonGuard {
    child: Child,
    pub home: PathBuf,
}

impl DaemonGuard {
    /// Spawn groved with GROVE_HOME pointed at `home` and wait for its
    /// socket to appear.
    pub fn spawn(home: &Path) -> Self {
        let child = Command::new(groved_bin())
            .env("GROVE_HOME", home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn groved");
        let socket = home.join("groved.sock");
        wait_for("daemon socket", || socket.exists());
        Self {
            child,
            home: home.to_path_buf(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn socket_path(&self) -> PathBuf {
        self.home.join("groved.sock")
    }

    /// Graceful stop via SIGTERM; waits for the process to exit.
    pub fn terminate(mut self) {
        let _ = Command::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .status();
        let started = Instant::now();
        while started.elapsed() < WAIT_TIMEOUT {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        panic!("daemon did not exit after SIGTERM");
    }
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Write a minimal grove config with the given workspace roots.
pub fn write_config(home: &Path, roots: &[&Path]) {
    let config_dir = home.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    let roots_toml: Vec<String> = roots
        .iter()
        .map(|r| format!("\"{}\"", r.display()))
        .collect();
    std::fs::write(
        config_dir.join("grove.toml"),
        format!("roots = [{}]\n", roots_toml.join(", ")),
    )
    .unwrap();
}

/// Create a project directory (a dir with a `.git` subdir).
pub fn make_project(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(path.join(".git")).unwrap();
    path
}
