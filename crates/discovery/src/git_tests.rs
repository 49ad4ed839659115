// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn parse_clean_tree() {
    let out = "# branch.oid 1234abcd\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +0 -0\n";
    let status = parse_porcelain(out);
    assert_eq!(status.branch, "main");
    assert!(!status.dirty);
    assert_eq!(status.ahead, 0);
    assert_eq!(status.behind, 0);
}

#[parameterized(
    in_sync = { "+0 -0", 0, 0 },
    ahead = { "+3 -0", 3, 0 },
    behind = { "+0 -2", 0, 2 },
    diverged = { "+3 -1", 3, 1 },
)]
fn parse_ahead_behind(ab: &str, ahead: u32, behind: u32) {
    let out = format!("# branch.head feature\n# branch.ab {ab}\n");
    let status = parse_porcelain(&out);
    assert_eq!(status.ahead, ahead);
    assert_eq!(status.behind, behind);
}

#[test]
fn parse_staged_and_modified() {
    let out = "\
# branch.head main
1 M. N... 100644 100644 100644 aaaa bbbb src/staged.rs
1 .M N... 100644 100644 100644 aaaa bbbb src/dirty.rs
1 MM N... 100644 100644 100644 aaaa bbbb src/both.rs
";
    let status = parse_porcelain(out);
    assert_eq!(status.staged, 2);
    assert_eq!(status.modified, 2);
    assert!(status.dirty);
}

#[test]
fn parse_renames_count_like_changes() {
    let out = "2 R. N... 100644 100644 100644 aaaa bbbb R100 new.rs\told.rs\n";
    let status = parse_porcelain(out);
    assert_eq!(status.staged, 1);
    assert!(status.dirty);
}

#[test]
fn parse_untracked() {
    let out = "# branch.head main\n? scratch.txt\n? notes.md\n";
    let status = parse_porcelain(out);
    assert_eq!(status.untracked, 2);
    assert!(status.dirty);
}

#[test]
fn parse_detached_head() {
    let out = "# branch.head (detached)\n";
    let status = parse_porcelain(out);
    assert_eq!(status.branch, "(detached)");
}

#[test]
fn parse_empty_output() {
    let status = parse_porcelain("");
    assert_eq!(status, GitStatus::default());
}
