// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use grove_core::{SessionStatus, UpdatePayload};
use std::time::Duration;

fn write_session(root: &Path, dir_name: &str, pid: u32) -> PathBuf {
    let dir = root.join(dir_name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("pid.lock"), pid.to_string()).unwrap();
    std::fs::write(
        dir.join("metadata.json"),
        serde_json::json!({
            "session_id": dir_name,
            "provider": "claude",
            "pid": pid,
            "started_at": "2024-03-01T09:00:00Z",
        })
        .to_string(),
    )
    .unwrap();
    dir
}

fn collector(sessions_dir: &Path) -> SessionCollector {
    SessionCollector::new(
        sessions_dir.to_path_buf(),
        Arc::new(Discovery::new(Vec::new())),
        None,
        Duration::from_millis(50),
        Duration::from_millis(200),
    )
    .with_cleanup_grace(Duration::from_millis(100))
}

struct Harness {
    rx: mpsc::Receiver<Update>,
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn spawn(collector: SessionCollector) -> Self {
        let store = Arc::new(Store::new());
        let (tx, rx) = mpsc::channel(32);
        let token = CancellationToken::new();
        let run_token = token.clone();
        let handle =
            tokio::spawn(async move { collector.run(run_token, store, tx).await });
        Self { rx, token, handle }
    }

    /// Wait for the next emission whose session list satisfies `pred`.
    async fn wait_for(&mut self, pred: impl Fn(&[grove_core::Session]) -> bool) -> Vec<grove_core::Session> {
        let deadline = Duration::from_secs(5);
        let sessions = tokio::time::timeout(deadline, async {
            loop {
                let update = match self.rx.recv().await {
                    Some(u) => u,
                    None => panic!("collector channel closed"),
                };
                if let UpdatePayload::Sessions(sessions) = update.payload {
                    if pred(&sessions) {
                        return sessions;
                    }
                }
            }
        })
        .await;
        match sessions {
            Ok(sessions) => sessions,
            Err(_) => panic!("timed out waiting for matching sessions update"),
        }
    }

    async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[tokio::test]
async fn tracked_live_session_is_emitted_as_running() {
    let dir = tempfile::tempdir().unwrap();
    write_session(dir.path(), "s1", std::process::id());

    let mut harness = Harness::spawn(collector(dir.path()));
    let sessions = harness
        .wait_for(|s| s.iter().any(|s| s.id == "s1"))
        .await;
    let s1 = sessions.iter().find(|s| s.id == "s1").unwrap();
    assert_eq!(s1.status, SessionStatus::Running);
    assert_eq!(s1.provider, "claude");

    harness.stop().await;
}

#[tokio::test]
async fn session_created_after_start_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::spawn(collector(dir.path()));

    // created after the collector is already watching
    tokio::time::sleep(Duration::from_millis(100)).await;
    write_session(dir.path(), "late", std::process::id());

    let sessions = harness
        .wait_for(|s| s.iter().any(|s| s.id == "late"))
        .await;
    assert_eq!(sessions.len(), 1);

    harness.stop().await;
}

#[tokio::test]
async fn dead_process_transitions_to_interrupted_then_cleans_up() {
    let dir = tempfile::tempdir().unwrap();

    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .unwrap();
    let session_dir = write_session(dir.path(), "s1", child.id());

    let mut harness = Harness::spawn(collector(dir.path()));
    harness
        .wait_for(|s| s.iter().any(|s| s.id == "s1" && s.status == SessionStatus::Running))
        .await;

    child.kill().unwrap();
    let _ = child.wait();

    // within one verification cycle: interrupted, ended_at set
    let sessions = harness
        .wait_for(|s| {
            s.iter()
                .any(|s| s.id == "s1" && s.status == SessionStatus::Interrupted)
        })
        .await;
    let s1 = sessions.iter().find(|s| s.id == "s1").unwrap();
    assert!(s1.ended_at.is_some());

    // after the grace period the directory is gone and the session drops
    // out of the merged view
    harness.wait_for(|s| s.is_empty()).await;
    assert!(!session_dir.exists());

    harness.stop().await;
}

#[tokio::test]
async fn removed_session_directory_drops_out_of_the_merged_view() {
    let dir = tempfile::tempdir().unwrap();
    let session_dir = write_session(dir.path(), "s1", std::process::id());

    let mut harness = Harness::spawn(collector(dir.path()));
    harness.wait_for(|s| s.iter().any(|s| s.id == "s1")).await;

    std::fs::remove_dir_all(&session_dir).unwrap();
    harness.wait_for(|s| s.is_empty()).await;

    harness.stop().await;
}

#[tokio::test]
async fn flow_job_fills_provider_for_interactive_session() {
    let root = tempfile::tempdir().unwrap();
    // one project workspace with a live flow job sharing the session id
    let project = root.path().join("code").join("app");
    std::fs::create_dir_all(project.join(".git")).unwrap();
    let plans = project.join("plans");
    std::fs::create_dir_all(&plans).unwrap();
    std::fs::write(
        plans.join("x.md"),
        "---\nid: X\ntype: chat\nprovider: claude\nstatus: running\n---\n",
    )
    .unwrap();

    let sessions_dir = root.path().join("sessions");
    std::fs::create_dir_all(&sessions_dir).unwrap();
    let session_dir = sessions_dir.join("X");
    std::fs::create_dir_all(&session_dir).unwrap();
    std::fs::write(session_dir.join("pid.lock"), std::process::id().to_string()).unwrap();
    std::fs::write(
        session_dir.join("metadata.json"),
        serde_json::json!({
            "session_id": "X",
            "pid": std::process::id(),
            "started_at": "2024-03-01T09:00:00Z",
        })
        .to_string(),
    )
    .unwrap();

    let collector = SessionCollector::new(
        sessions_dir,
        Arc::new(Discovery::new(vec![root.path().join("code")])),
        None,
        Duration::from_millis(50),
        Duration::from_millis(100),
    );
    let mut harness = Harness::spawn(collector);

    let sessions = harness
        .wait_for(|s| s.iter().any(|s| s.id == "X" && !s.provider.is_empty()))
        .await;
    assert_eq!(sessions.len(), 1, "same id must merge to one session");
    let x = &sessions[0];
    // interactive wins the live-state fields, flow job donates provider
    assert_eq!(x.kind, grove_core::SessionKind::Interactive);
    assert_eq!(x.pid, std::process::id());
    assert_eq!(x.status, SessionStatus::Running);
    assert_eq!(x.provider, "claude");

    harness.stop().await;
}
