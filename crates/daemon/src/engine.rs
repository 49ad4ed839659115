// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collector lifecycle and the update fan-in loop.
//!
//! Every collector runs on its own task and emits onto one bounded
//! channel. A single consumer applies updates to the store, which both
//! serialises `apply_update` without collectors contending for the store
//! lock and makes broadcast ordering deterministic.

use crate::store::Store;
use async_trait::async_trait;
use grove_core::Update;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bound on the fan-in channel between collectors and the consumer.
pub const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// A background task maintaining one facet of the store.
///
/// `run` blocks until the token is cancelled, emitting updates on the
/// given channel. Implementations never close the channel and never
/// return errors — transient failures are absorbed locally.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        shutdown: CancellationToken,
        store: Arc<Store>,
        updates: mpsc::Sender<Update>,
    );
}

/// Owns the collector set and the per-process update loop.
pub struct Engine {
    store: Arc<Store>,
    collectors: Vec<Arc<dyn Collector>>,
}

impl Engine {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            collectors: Vec::new(),
        }
    }

    /// Append a collector; must happen before [`Engine::start`].
    pub fn register(&mut self, collector: impl Collector) {
        self.collectors.push(Arc::new(collector));
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Launch one task per collector plus the consumer task.
    ///
    /// All tasks exit when the token is cancelled; the returned handles
    /// let the caller join them on shutdown.
    pub fn start(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let (tx, mut rx) = mpsc::channel::<Update>(UPDATE_CHANNEL_CAPACITY);
        let mut handles = Vec::with_capacity(self.collectors.len() + 1);

        for collector in &self.collectors {
            let collector = Arc::clone(collector);
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            let token = shutdown.clone();
            handles.push(tokio::spawn(async move {
                debug!(collector = collector.name(), "collector started");
                collector.run(token, store, tx).await;
                debug!(collector = collector.name(), "collector stopped");
            }));
        }
        drop(tx);

        let store = Arc::clone(&self.store);
        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    update = rx.recv() => match update {
                        Some(update) => store.apply_update(update),
                        None => break,
                    },
                }
            }
            debug!("engine consumer stopped");
        }));

        handles
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
