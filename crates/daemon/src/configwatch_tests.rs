// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use notify::event::{CreateKind, DataChange, EventKind, ModifyKind};
use std::time::Duration;

fn modify_event(path: &Path) -> notify::Event {
    notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.to_path_buf())
}

fn watcher_for(dir: &Path, hooks: Vec<ReloadHook>) -> ConfigWatcher {
    ConfigWatcher::new(dir.to_path_buf(), hooks, Duration::from_millis(50))
}

#[test]
fn changed_files_reports_direct_entries() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = watcher_for(dir.path(), Vec::new());
    let batch = vec![modify_event(&dir.path().join("grove.toml"))];

    let changed = watcher.changed_files(&batch, &HashMap::new());
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].0, "grove.toml");
}

#[test]
fn changed_files_dedupes_within_a_batch() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = watcher_for(dir.path(), Vec::new());
    let path = dir.path().join("grove.toml");
    let batch = vec![
        notify::Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone()),
        modify_event(&path),
        modify_event(&path),
    ];

    let changed = watcher.changed_files(&batch, &HashMap::new());
    assert_eq!(changed.len(), 1);
}

#[test]
fn changed_files_maps_symlink_targets_back_to_link_names() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = watcher_for(dir.path(), Vec::new());
    let target = PathBuf::from("/dotfiles/grove/keys.toml");
    let link_map = HashMap::from([(target.clone(), "keys.toml".to_string())]);

    let changed = watcher.changed_files(&[modify_event(&target)], &link_map);
    assert_eq!(changed[0].0, "keys.toml");
    assert_eq!(changed[0].1, target);
}

#[test]
fn changed_files_ignores_unrelated_paths() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = watcher_for(dir.path(), Vec::new());
    let batch = vec![modify_event(Path::new("/somewhere/else/file.toml"))];

    assert!(watcher.changed_files(&batch, &HashMap::new()).is_empty());
}

#[test]
fn root_segment_takes_the_first_dotted_part() {
    assert_eq!(root_segment("keys.tmux"), "keys");
    assert_eq!(root_segment("theme"), "theme");
}

#[tokio::test]
async fn burst_of_edits_collapses_to_one_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("grove.toml");
    std::fs::write(&config, "roots = []\n").unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let token = CancellationToken::new();
    let handle = watcher_for(dir.path(), Vec::new())
        .spawn(token.clone(), move |name| {
            let _ = tx.send(name.to_string());
        })
        .unwrap();

    // two writes within the debounce window
    std::fs::write(&config, "roots = [\"/a\"]\n").unwrap();
    std::fs::write(&config, "roots = [\"/a\", \"/b\"]\n").unwrap();

    let name = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(name, "grove.toml");

    // no second notification for the same burst
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn hook_fires_once_for_a_debounced_burst() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("grove.toml");
    std::fs::write(&config, "roots = []\n").unwrap();
    let marker = dir.path().join("hook-ran");

    let hooks = vec![ReloadHook {
        section: "keys.tmux".into(),
        command: vec![
            "/bin/sh".into(),
            "-c".into(),
            format!("echo hit >> {}", marker.display()),
        ],
    }];

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let token = CancellationToken::new();
    let handle = watcher_for(dir.path(), hooks)
        .spawn(token.clone(), move |name| {
            let _ = tx.send(name.to_string());
        })
        .unwrap();

    std::fs::write(&config, "a\n").unwrap();
    std::fs::write(&config, "b\n").unwrap();

    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    // let the spawned hook command finish
    tokio::time::sleep(Duration::from_millis(300)).await;

    let hits = std::fs::read_to_string(&marker).unwrap_or_default();
    assert_eq!(hits.lines().count(), 1, "hook must fire exactly once");

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn section_hook_requires_matching_contents() {
    let dir = tempfile::tempdir().unwrap();
    let fragment = dir.path().join("extra.toml");
    std::fs::write(&fragment, "unrelated = true\n").unwrap();
    let marker = dir.path().join("hook-ran");

    let hooks = vec![ReloadHook {
        section: "keys.tmux".into(),
        command: vec![
            "/bin/sh".into(),
            "-c".into(),
            format!("echo hit >> {}", marker.display()),
        ],
    }];

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let token = CancellationToken::new();
    let handle = watcher_for(dir.path(), hooks)
        .spawn(token.clone(), move |name| {
            let _ = tx.send(name.to_string());
        })
        .unwrap();

    // contents do not mention "keys": hook stays quiet
    std::fs::write(&fragment, "unrelated = false\n").unwrap();
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!marker.exists());

    // now the fragment mentions the root segment
    std::fs::write(&fragment, "[keys]\ntmux = \"reload\"\n").unwrap();
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(marker.exists());

    token.cancel();
    handle.await.unwrap();
}
