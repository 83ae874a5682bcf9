//! Deduplicating work queue keyed by resource.
//!
//! A key is in at most one of three places: the ready queue, in flight
//! with a worker, or nowhere. Re-adding a key that is in flight marks it
//! dirty and it is queued again when the worker calls [`WorkQueue::done`].

use crate::config::BackoffPolicy;
use conductor_domain::ResourceKey;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Default)]
struct QueueState {
    ready: VecDeque<ResourceKey>,
    queued: HashSet<ResourceKey>,
    in_flight: HashSet<ResourceKey>,
    dirty: HashSet<ResourceKey>,
    failures: HashMap<ResourceKey, u32>,
}

pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    backoff: BackoffPolicy,
    shutdown: CancellationToken,
}

impl WorkQueue {
    pub fn new(backoff: BackoffPolicy, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            backoff,
            shutdown,
        })
    }

    /// Enqueue `key` unless it is already waiting.
    pub async fn add(&self, key: ResourceKey) {
        let mut state = self.state.lock().await;
        if state.in_flight.contains(&key) {
            trace!(%key, "Key in flight; marked dirty");
            state.dirty.insert(key);
            return;
        }
        if state.queued.insert(key.clone()) {
            state.ready.push_back(key);
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Enqueue `key` after `delay`, unless the queue shuts down first.
    pub fn add_after(self: &Arc<Self>, key: ResourceKey, delay: Duration) {
        if delay.is_zero() {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.add(key).await });
            return;
        }
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = queue.shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => queue.add(key).await,
            }
        });
    }

    /// Requeue `key` after its next backoff delay.
    pub async fn backoff(self: &Arc<Self>, key: ResourceKey) -> Duration {
        let delay = {
            let mut state = self.state.lock().await;
            let attempts = state.failures.entry(key.clone()).or_insert(0);
            let delay = self.backoff.delay(*attempts);
            *attempts = attempts.saturating_add(1);
            delay
        };
        self.add_after(key, delay);
        delay
    }

    /// Reset the backoff of `key` after a successful pass.
    pub async fn forget(&self, key: &ResourceKey) {
        self.state.lock().await.failures.remove(key);
    }

    /// Wait for the next key. `None` once the queue has shut down.
    pub async fn next(&self) -> Option<ResourceKey> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if self.shutdown.is_cancelled() {
                    return None;
                }
                if let Some(key) = state.ready.pop_front() {
                    state.queued.remove(&key);
                    state.in_flight.insert(key.clone());
                    return Some(key);
                }
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                _ = notified => {}
            }
        }
    }

    /// Release `key` from its worker; a dirty key goes straight back on the queue.
    pub async fn done(&self, key: &ResourceKey) {
        let mut state = self.state.lock().await;
        state.in_flight.remove(key);
        if state.dirty.remove(key) && state.queued.insert(key.clone()) {
            state.ready.push_back(key.clone());
            drop(state);
            self.notify.notify_one();
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn failures(&self, key: &ResourceKey) -> u32 {
        self.state
            .lock()
            .await
            .failures
            .get(key)
            .copied()
            .unwrap_or(0)
    }
}
