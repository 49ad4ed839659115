// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_session_file(storage: &Path, hash: &str, id: &str, json: serde_json::Value) {
    let dir = storage.join("session").join(hash);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{id}.json")), json.to_string()).unwrap();
}

fn now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_710_000_000_000).single().unwrap()
}

fn recent_millis() -> i64 {
    1_710_000_000_000 - 60_000 // one minute before `now`
}

#[test]
fn recent_session_is_surfaced() {
    let storage = tempfile::tempdir().unwrap();
    write_session_file(
        storage.path(),
        "abc123",
        "ses_1",
        serde_json::json!({
            "id": "ses_1",
            "projectID": "proj-1",
            "directory": "/home/dev/app",
            "title": "explore the parser",
            "time": { "created": recent_millis() - 600_000, "updated": recent_millis() },
        }),
    );

    let sessions = scan_opencode(storage.path(), now());
    assert_eq!(sessions.len(), 1);
    let s = &sessions[0];
    assert_eq!(s.id, "ses_1");
    assert_eq!(s.kind, SessionKind::Opencode);
    assert_eq!(s.provider, "opencode");
    assert_eq!(s.job_title.as_deref(), Some("explore the parser"));
    assert_eq!(
        s.working_directory.as_deref(),
        Some(Path::new("/home/dev/app"))
    );
    assert!(s.last_activity > s.started_at);
}

#[test]
fn stale_sessions_are_filtered_out() {
    let storage = tempfile::tempdir().unwrap();
    let two_days_ago: i64 = 1_710_000_000_000 - 2 * 24 * 3600 * 1000;
    write_session_file(
        storage.path(),
        "abc123",
        "ses_old",
        serde_json::json!({
            "id": "ses_old",
            "time": { "created": two_days_ago, "updated": two_days_ago },
        }),
    );

    assert!(scan_opencode(storage.path(), now()).is_empty());
}

#[test]
fn directory_falls_back_to_project_map() {
    let storage = tempfile::tempdir().unwrap();
    let project_dir = storage.path().join("project");
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(
        project_dir.join("proj-1.json"),
        serde_json::json!({ "id": "proj-1", "worktree": "/home/dev/mapped" }).to_string(),
    )
    .unwrap();
    write_session_file(
        storage.path(),
        "abc123",
        "ses_1",
        serde_json::json!({
            "id": "ses_1",
            "projectID": "proj-1",
            "time": { "created": recent_millis(), "updated": recent_millis() },
        }),
    );

    let sessions = scan_opencode(storage.path(), now());
    assert_eq!(
        sessions[0].working_directory.as_deref(),
        Some(Path::new("/home/dev/mapped"))
    );
}

#[test]
fn non_session_files_are_ignored() {
    let storage = tempfile::tempdir().unwrap();
    let dir = storage.path().join("session").join("abc123");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.json"), "{}").unwrap();
    std::fs::write(dir.join("ses_bad.json"), "not json").unwrap();

    assert!(scan_opencode(storage.path(), now()).is_empty());
}

#[test]
fn missing_storage_root_is_empty() {
    assert!(scan_opencode(Path::new("/nonexistent/opencode"), now()).is_empty());
}
