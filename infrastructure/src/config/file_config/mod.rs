//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section defaults independently, so a file may name only what it
//! changes.

mod admission;
mod controller;
mod kubernetes;
mod license;
mod logging;
mod output;
mod workflow;

pub use admission::FileAdmissionConfig;
pub use controller::{Backend, FileControllerConfig};
pub use kubernetes::{FileKubernetesConfig, IN_CLUSTER_API_SERVER, SERVICE_ACCOUNT_DIR};
pub use license::FileLicenseConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use workflow::FileWorkflowConfig;

use conductor_application::ControllerParams;
use conductor_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Worker pool and requeue cadence
    pub controller: FileControllerConfig,
    /// Values stamped into created workflows
    pub workflow: FileWorkflowConfig,
    /// Licence token and verification key
    pub license: FileLicenseConfig,
    /// Admission hook settings
    pub admission: FileAdmissionConfig,
    /// Audit trail and log file locations
    pub logging: FileLoggingConfig,
    /// API server connection
    pub kubernetes: FileKubernetesConfig,
    /// Operator command output
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.controller.validate());
        issues.extend(self.workflow.validate());
        issues.extend(self.license.validate());
        issues.extend(self.admission.validate());
        if self.controller.backend == Backend::Kubernetes {
            issues.extend(self.kubernetes.validate());
        }
        issues
    }

    pub fn controller_params(&self) -> ControllerParams {
        self.controller.to_params(self.admission.probe_timeout())
    }
}
