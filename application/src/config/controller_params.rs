//! Controller parameters: work queue and reconcile cadence.
//!
//! [`ControllerParams`] groups the static knobs of the control loop. They
//! are application-layer concerns, not domain policy, and are filled from
//! the `[controller]` and `[admission]` configuration sections.

use super::backoff::BackoffPolicy;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerParams {
    /// Concurrent reconcile workers. Each key is still handled by one worker at a time.
    pub workers: usize,
    /// Period of the full list-and-enqueue pass.
    pub resync_interval: Duration,
    /// Requeue delay while a workflow is running or suspended.
    pub running_requeue: Duration,
    /// Backoff for transient failures.
    pub backoff: BackoffPolicy,
    /// Timeout of the best-effort endpoint probe during admission.
    pub probe_timeout: Duration,
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self {
            workers: 4,
            resync_interval: Duration::from_secs(30),
            running_requeue: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl ControllerParams {
    // ==================== Builder Methods ====================

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    pub fn with_running_requeue(mut self, delay: Duration) -> Self {
        self.running_requeue = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
