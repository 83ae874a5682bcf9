//! Workflow configuration from TOML (`[workflow]` section)

use conductor_domain::workload::validate_endpoint;
use conductor_domain::{ConfigIssue, WorkflowDefaults};
use serde::{Deserialize, Serialize};

/// Values stamped into every created workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkflowConfig {
    /// Namespace the workflows and the template live in
    pub namespace: String,
    /// Name of the workflow template every workflow references
    pub template: String,
    pub agent_image: String,
    pub artifact_bucket: String,
    pub llm_endpoint: String,
    pub checkpoint_dsn: String,
    pub default_target_urls: Vec<String>,
}

impl Default for FileWorkflowConfig {
    fn default() -> Self {
        let defaults = WorkflowDefaults::default();
        Self {
            namespace: defaults.namespace,
            template: defaults.template,
            agent_image: defaults.agent_image,
            artifact_bucket: defaults.artifact_bucket,
            llm_endpoint: defaults.llm_endpoint,
            checkpoint_dsn: defaults.checkpoint_dsn,
            default_target_urls: defaults.default_target_urls,
        }
    }
}

impl FileWorkflowConfig {
    pub fn to_defaults(&self) -> WorkflowDefaults {
        WorkflowDefaults {
            namespace: self.namespace.clone(),
            template: self.template.clone(),
            agent_image: self.agent_image.clone(),
            artifact_bucket: self.artifact_bucket.clone(),
            llm_endpoint: self.llm_endpoint.clone(),
            checkpoint_dsn: self.checkpoint_dsn.clone(),
            default_target_urls: self.default_target_urls.clone(),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.namespace.trim().is_empty() {
            issues.push(ConfigIssue::error("workflow.namespace", "must not be empty"));
        }
        if self.template.trim().is_empty() {
            issues.push(ConfigIssue::error("workflow.template", "must not be empty"));
        }
        if self.agent_image.trim().is_empty() {
            issues.push(ConfigIssue::warning(
                "workflow.agent_image",
                "empty; the template's own default image will be used",
            ));
        }
        if let Err(e) = validate_endpoint("workflow.llm_endpoint", &self.llm_endpoint) {
            issues.push(ConfigIssue::warning(e.field, e.message));
        }
        for (i, url) in self.default_target_urls.iter().enumerate() {
            let field = format!("workflow.default_target_urls[{}]", i);
            if let Err(e) = validate_endpoint(&field, url) {
                issues.push(ConfigIssue::warning(e.field, e.message));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        assert_eq!(
            FileWorkflowConfig::default().to_defaults(),
            WorkflowDefaults::default()
        );
        assert!(FileWorkflowConfig::default().validate().is_empty());
    }

    #[test]
    fn test_partial_override() {
        let config: FileWorkflowConfig = toml::from_str(
            r#"
namespace = "workflows"
default_target_urls = ["https://status.internal", "ftp://mirror"]
"#,
        )
        .unwrap();
        assert_eq!(config.to_defaults().namespace, "workflows");
        assert_eq!(config.template, "agentic-pipeline");

        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "workflow.default_target_urls[1]");
    }

    #[test]
    fn test_empty_template_is_an_error() {
        let config = FileWorkflowConfig {
            template: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().iter().any(|i| i.is_error()));
    }
}
