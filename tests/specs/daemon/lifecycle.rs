//! Daemon startup and shutdown behaviour.

use crate::prelude::*;
use std::os::unix::fs::PermissionsExt;

#[test]
fn daemon_creates_owner_only_socket_and_pid_file() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let daemon = DaemonGuard::spawn(home.path());

    let socket = daemon.socket_path();
    let mode = std::fs::metadata(&socket).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600, "socket must be owner-only");

    let pid = std::fs::read_to_string(home.path().join("groved.pid")).unwrap();
    assert_eq!(pid.trim(), daemon.pid().to_string());

    daemon.terminate();
}

#[test]
fn sigterm_removes_runtime_files() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let daemon = DaemonGuard::spawn(home.path());
    let socket = daemon.socket_path();
    let pid_file = home.path().join("groved.pid");
    assert!(socket.exists());
    assert!(pid_file.exists());

    daemon.terminate();

    wait_for("socket removal", || !socket.exists());
    assert!(!pid_file.exists(), "pid file must be removed on shutdown");
}

#[test]
fn second_daemon_refuses_to_start() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let daemon = DaemonGuard::spawn(home.path());

    let output = std::process::Command::new(groved_bin())
        .env("GROVE_HOME", home.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr).into_owned();
    assert!(err.contains("already running"), "got: {err}");

    daemon.terminate();
}

#[test]
fn client_prefers_the_daemon_when_the_socket_accepts() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let daemon = DaemonGuard::spawn(home.path());

    // `grove status` goes through the client and reports daemon mode
    let mut cmd = assert_cmd::Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("status").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains("mode: daemon"), "got: {out}");

    daemon.terminate();
}
