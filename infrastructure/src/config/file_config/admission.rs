//! Admission configuration from TOML (`[admission]` section)

use conductor_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAdmissionConfig {
    /// Timeout of the engine endpoint reachability probe
    pub probe_timeout_secs: u64,
}

impl Default for FileAdmissionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
        }
    }
}

impl FileAdmissionConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.probe_timeout_secs == 0 {
            return vec![ConfigIssue::warning(
                "admission.probe_timeout_secs",
                "0 makes every endpoint probe time out",
            )];
        }
        Vec::new()
    }
}
