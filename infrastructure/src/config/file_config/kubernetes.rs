//! Kubernetes API configuration from TOML (`[kubernetes]` section)
//!
//! Unset values fall back to the in-cluster service account.

use conductor_domain::ConfigIssue;
use conductor_domain::workload::validate_endpoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const IN_CLUSTER_API_SERVER: &str = "https://kubernetes.default.svc";
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKubernetesConfig {
    pub api_server: Option<String>,
    /// Bearer token file
    pub token_file: Option<PathBuf>,
    /// PEM bundle used to verify the API server
    pub ca_file: Option<PathBuf>,
    /// Skip TLS verification
    pub insecure: bool,
}

impl FileKubernetesConfig {
    pub fn api_server(&self) -> &str {
        self.api_server.as_deref().unwrap_or(IN_CLUSTER_API_SERVER)
    }

    pub fn token_file(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(SERVICE_ACCOUNT_DIR).join("token"))
    }

    pub fn ca_file(&self) -> PathBuf {
        self.ca_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(SERVICE_ACCOUNT_DIR).join("ca.crt"))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if let Err(e) = validate_endpoint("kubernetes.api_server", self.api_server()) {
            issues.push(ConfigIssue::error(e.field, e.message));
        }
        if self.insecure {
            issues.push(ConfigIssue::warning(
                "kubernetes.insecure",
                "TLS verification of the API server is disabled",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_cluster_defaults() {
        let config = FileKubernetesConfig::default();
        assert_eq!(config.api_server(), IN_CLUSTER_API_SERVER);
        assert_eq!(
            config.token_file(),
            PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/token")
        );
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_insecure_warns() {
        let config = FileKubernetesConfig {
            api_server: Some("https://127.0.0.1:6443".to_string()),
            insecure: true,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }
}
