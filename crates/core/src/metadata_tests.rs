// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn sample() -> SessionMetadata {
    SessionMetadata {
        session_id: "sess-1".into(),
        claude_session_id: Some("c0ffee".into()),
        provider: "claude".into(),
        pid: 1234,
        repo: "grove".into(),
        branch: "main".into(),
        working_directory: Some("/home/dev/grove".into()),
        user: "dev".into(),
        started_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
        transcript_path: Some("/tmp/transcript.jsonl".into()),
        job_title: None,
        plan_name: None,
        job_file_path: None,
    }
}

#[test]
fn load_round_trips_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let meta = sample();
    std::fs::write(
        dir.path().join(METADATA_FILE),
        serde_json::to_string(&meta).unwrap(),
    )
    .unwrap();

    let loaded = SessionMetadata::load(dir.path()).unwrap();
    assert_eq!(loaded, meta);
}

#[test]
fn load_tolerates_missing_optional_fields() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(METADATA_FILE),
        r#"{"session_id":"s","started_at":"2024-01-05T10:00:00Z"}"#,
    )
    .unwrap();

    let loaded = SessionMetadata::load(dir.path()).unwrap();
    assert_eq!(loaded.session_id, "s");
    assert_eq!(loaded.pid, 0);
    assert!(loaded.claude_session_id.is_none());
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SessionMetadata::load(dir.path()),
        Err(MetadataError::Io(_))
    ));
}

#[test]
fn pid_file_parses_with_and_without_newline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(PID_FILE), "4321").unwrap();
    assert_eq!(read_pid_file(dir.path()).unwrap(), 4321);

    std::fs::write(dir.path().join(PID_FILE), "4321\n").unwrap();
    assert_eq!(read_pid_file(dir.path()).unwrap(), 4321);
}

#[test]
fn pid_file_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(PID_FILE), "not-a-pid").unwrap();
    assert!(matches!(
        read_pid_file(dir.path()),
        Err(MetadataError::InvalidPid(_))
    ));
}
