//! Controller configuration from TOML (`[controller]` section)

use conductor_application::{BackoffPolicy, ControllerParams};
use conductor_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the controller reads and writes resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The Kubernetes API server
    #[default]
    Kubernetes,
    /// A process-local store, for demos and tests
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileControllerConfig {
    /// Concurrent reconcile workers
    pub workers: usize,
    /// Seconds between full list-and-enqueue passes
    pub resync_interval_secs: u64,
    /// Requeue delay while a workflow runs or waits for approval
    pub running_requeue_secs: u64,
    /// First backoff delay after a transient failure
    pub backoff_base_ms: u64,
    /// Longest backoff delay
    pub backoff_cap_secs: u64,
    pub backend: Backend,
}

impl Default for FileControllerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            resync_interval_secs: 30,
            running_requeue_secs: 30,
            backoff_base_ms: 500,
            backoff_cap_secs: 300,
            backend: Backend::default(),
        }
    }
}

impl FileControllerConfig {
    /// Controller parameters; the probe timeout comes from `[admission]`.
    pub fn to_params(&self, probe_timeout: Duration) -> ControllerParams {
        ControllerParams::default()
            .with_workers(self.workers)
            .with_resync_interval(Duration::from_secs(self.resync_interval_secs.max(1)))
            .with_running_requeue(Duration::from_secs(self.running_requeue_secs))
            .with_backoff(BackoffPolicy::new(
                Duration::from_millis(self.backoff_base_ms),
                Duration::from_secs(self.backoff_cap_secs),
            ))
            .with_probe_timeout(probe_timeout)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.workers == 0 {
            issues.push(ConfigIssue::warning(
                "controller.workers",
                "0 workers requested; running with 1",
            ));
        }
        if self.resync_interval_secs == 0 {
            issues.push(ConfigIssue::error(
                "controller.resync_interval_secs",
                "must be at least 1 second",
            ));
        }
        if self.running_requeue_secs == 0 {
            issues.push(ConfigIssue::warning(
                "controller.running_requeue_secs",
                "0 requeues running workloads as fast as the workers allow",
            ));
        }
        if Duration::from_millis(self.backoff_base_ms) > Duration::from_secs(self.backoff_cap_secs)
        {
            issues.push(ConfigIssue::warning(
                "controller.backoff_base_ms",
                format!(
                    "base delay {}ms exceeds the cap of {}s; every retry waits the cap",
                    self.backoff_base_ms, self.backoff_cap_secs
                ),
            ));
        }
        issues
    }
}
