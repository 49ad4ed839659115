//! Help and version output.

use crate::prelude::*;
use assert_cmd::Command;

#[test]
fn grove_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for sub in ["status", "workspaces", "sessions", "focus", "watch", "daemon"] {
        assert!(out.contains(sub), "help missing `{sub}`:\n{out}");
    }
}

#[test]
fn grove_version_prints_version() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = Command::from_std(grove_cmd(home.path()));
    let assert = cmd.arg("--version").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains(env!("CARGO_PKG_VERSION")), "got: {out}");
}

#[test]
fn groved_help_explains_itself() {
    let mut cmd = Command::new(groved_bin());
    let assert = cmd.arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains("Unix socket"), "unexpected help:\n{out}");
}

#[test]
fn groved_rejects_unknown_arguments() {
    let mut cmd = Command::new(groved_bin());
    cmd.arg("--bogus").assert().failure();
}
