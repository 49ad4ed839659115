// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced config-directory watching with reload hooks.
//!
//! Watch primitives do not traverse symlinks, so symlinked config entries
//! have their resolved target's parent directory watched as well, with a
//! map from target path back to link name for stable event naming.
//! Symlinks added after startup are not tracked until restart.

use grove_discovery::{ReloadHook, CONFIG_FILE};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Extensions of config entries eligible for symlink resolution.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yml", "yaml"];

pub struct ConfigWatcher {
    config_dir: PathBuf,
    hooks: Vec<ReloadHook>,
    debounce: Duration,
}

impl ConfigWatcher {
    pub fn new(config_dir: PathBuf, hooks: Vec<ReloadHook>, debounce: Duration) -> Self {
        Self {
            config_dir,
            hooks,
            debounce,
        }
    }

    /// Start watching; `on_reload` receives the changed file's basename
    /// after the hooks have been dispatched.
    pub fn spawn(
        self,
        shutdown: CancellationToken,
        on_reload: impl Fn(&str) + Send + Sync + 'static,
    ) -> Result<JoinHandle<()>, notify::Error> {
        let (tx, rx) = mpsc::channel::<notify::Event>(64);
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.blocking_send(event);
                }
            })?;
        watcher.watch(&self.config_dir, RecursiveMode::NonRecursive)?;

        let link_map = resolve_symlinks(&self.config_dir, &mut watcher);

        Ok(tokio::spawn(self.run(watcher, rx, link_map, shutdown, on_reload)))
    }

    async fn run(
        self,
        _watcher: RecommendedWatcher,
        mut rx: mpsc::Receiver<notify::Event>,
        link_map: HashMap<PathBuf, String>,
        shutdown: CancellationToken,
        on_reload: impl Fn(&str) + Send + Sync + 'static,
    ) {
        loop {
            let first = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            // Debounce: everything arriving inside the window collapses
            // into this batch
            tokio::time::sleep(self.debounce).await;
            let mut batch = vec![first];
            while let Ok(event) = rx.try_recv() {
                batch.push(event);
            }

            let changed = self.changed_files(&batch, &link_map);
            for (name, contents_path) in changed {
                self.fire_hooks(&name, &contents_path);
                on_reload(&name);
            }
        }
    }

    /// Map a batch of raw events to the set of changed config files:
    /// `(reported name, path to read contents from)`.
    fn changed_files(
        &self,
        batch: &[notify::Event],
        link_map: &HashMap<PathBuf, String>,
    ) -> Vec<(String, PathBuf)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for event in batch {
            for path in &event.paths {
                let (name, contents_path) = if let Some(link_name) = link_map.get(path) {
                    // Event on a symlink target: report it as the link
                    (link_name.clone(), path.clone())
                } else if path.parent() == Some(self.config_dir.as_path()) {
                    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
                    else {
                        continue;
                    };
                    (name, path.clone())
                } else {
                    // Unrelated file in a watched target directory
                    continue;
                };
                if seen.insert(name.clone()) {
                    out.push((name, contents_path));
                }
            }
        }
        out
    }

    /// A hook fires when the top-level config file changed, or when the
    /// changed file mentions the root segment of the hook's section path.
    /// The `contains` check is deliberately naive.
    fn fire_hooks(&self, name: &str, contents_path: &Path) {
        let contents = if name == CONFIG_FILE {
            None // always fires, no need to read
        } else {
            std::fs::read_to_string(contents_path).ok()
        };

        for hook in &self.hooks {
            let fires = name == CONFIG_FILE
                || contents
                    .as_deref()
                    .is_some_and(|c| c.contains(root_segment(&hook.section)));
            if !fires {
                continue;
            }
            run_hook(hook.clone());
        }
    }
}

/// Resolve symlinked config entries and watch their target directories.
/// Returns target path → link basename.
fn resolve_symlinks(
    config_dir: &Path,
    watcher: &mut RecommendedWatcher,
) -> HashMap<PathBuf, String> {
    let mut link_map = HashMap::new();
    let Ok(entries) = std::fs::read_dir(config_dir) else {
        return link_map;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_config = path
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| CONFIG_EXTENSIONS.contains(&x));
        if !is_config {
            continue;
        }
        let Ok(meta) = std::fs::symlink_metadata(&path) else {
            continue;
        };
        if !meta.file_type().is_symlink() {
            continue;
        }
        let Ok(target) = std::fs::canonicalize(&path) else {
            continue;
        };
        if let Some(target_dir) = target.parent() {
            if let Err(e) = watcher.watch(target_dir, RecursiveMode::NonRecursive) {
                warn!(dir = %target_dir.display(), error = %e, "failed to watch symlink target dir");
                continue;
            }
        }
        let link_name = entry.file_name().to_string_lossy().into_owned();
        debug!(target = %target.display(), link = %link_name, "watching symlink target");
        link_map.insert(target, link_name);
    }
    link_map
}

fn root_segment(section: &str) -> &str {
    section.split('.').next().unwrap_or(section)
}

/// Run one hook command asynchronously; failures are logged, never fatal.
fn run_hook(hook: ReloadHook) {
    let Some((program, args)) = hook.command.split_first() else {
        warn!(section = %hook.section, "hook has empty command");
        return;
    };
    let program = program.clone();
    let args = args.to_vec();
    tokio::spawn(async move {
        match tokio::process::Command::new(&program).args(&args).status().await {
            Ok(status) if status.success() => {
                debug!(section = %hook.section, "hook completed");
            }
            Ok(status) => {
                warn!(section = %hook.section, %status, "hook exited non-zero");
            }
            Err(e) => {
                warn!(section = %hook.section, error = %e, "hook failed to start");
            }
        }
    });
}

#[cfg(test)]
#[path = "configwatch_tests.rs"]
mod tests;
