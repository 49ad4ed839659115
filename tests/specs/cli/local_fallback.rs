//! Transparent fallback when no daemon is running.

use crate::prelude::*;
use assert_cmd::Command;

#[test]
fn workspaces_work_without_a_daemon() {
    let home = tempfile::tempdir().unwrap();
    let code = tempfile::tempdir().unwrap();
    make_project(code.path(), "app");
    write_config(home.path(), &[code.path()]);

    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.args(["workspaces", "--json"]).assert().success();
    let out: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let names: Vec<&str> = out
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|w| w["name"].as_str())
        .collect();
    assert!(names.contains(&"app"), "missing project in {names:?}");
}

#[test]
fn status_reports_local_mode() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("status").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains("mode: local"), "got: {out}");
}

#[test]
fn watch_fails_with_a_local_mode_message() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("watch").assert().failure();
    let err = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(err.contains("local mode"), "got: {err}");
}

#[test]
fn sessions_without_a_daemon_report_empty() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &[]);

    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("sessions").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains("no active sessions"), "got: {out}");
}
