//! Focus round-trip through the daemon.

use crate::prelude::*;
use assert_cmd::Command;

#[test]
fn focus_set_then_get_round_trips() {
    let home = tempfile::tempdir().unwrap();
    let code = tempfile::tempdir().unwrap();
    let project = make_project(code.path(), "app");
    write_config(home.path(), &[code.path()]);

    let daemon = DaemonGuard::spawn(home.path());

    let mut set = Command::from_std(grove_cmd(home.path()));
    let assert = set
        .args(["focus", &project.display().to_string()])
        .assert()
        .success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains("focused 1"), "got: {out}");

    let mut get = Command::from_std(grove_cmd(home.path()));
    let assert = get.arg("focus").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(
        out.contains(&project.display().to_string()),
        "got: {out}"
    );

    daemon.terminate();
}

#[test]
fn replacing_the_focus_set_discards_the_old_one() {
    let home = tempfile::tempdir().unwrap();
    let code = tempfile::tempdir().unwrap();
    let a = make_project(code.path(), "a");
    let b = make_project(code.path(), "b");
    write_config(home.path(), &[code.path()]);

    let daemon = DaemonGuard::spawn(home.path());

    let mut first = Command::from_std(grove_cmd(home.path()));
    first
        .args(["focus", &a.display().to_string()])
        .assert()
        .success();
    let mut second = Command::from_std(grove_cmd(home.path()));
    second
        .args(["focus", &b.display().to_string()])
        .assert()
        .success();

    let mut get = Command::from_std(grove_cmd(home.path()));
    let assert = get.arg("focus").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(out.contains(&b.display().to_string()), "got: {out}");
    assert!(!out.contains(&a.display().to_string()), "got: {out}");

    daemon.terminate();
}
