//! Parameters handed to the workflow template.
//!
//! Values on the wire are always strings. Non-scalar logical values (the
//! target URL list) are JSON-encoded at this boundary and nowhere else.

use crate::workload::AgentWorkload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_WORKFLOW_NAMESPACE: &str = "argo-workflows";
pub const DEFAULT_WORKFLOW_TEMPLATE: &str = "agentic-pipeline";

/// Installation-wide values the workload does not declare itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefaults {
    pub namespace: String,
    pub template: String,
    pub agent_image: String,
    pub artifact_bucket: String,
    pub llm_endpoint: String,
    pub checkpoint_dsn: String,
    pub default_target_urls: Vec<String>,
}

impl Default for WorkflowDefaults {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_WORKFLOW_NAMESPACE.to_string(),
            template: DEFAULT_WORKFLOW_TEMPLATE.to_string(),
            agent_image: "ghcr.io/agentic-conductor/agent-runtime:latest".to_string(),
            artifact_bucket: "agentic-artifacts".to_string(),
            llm_endpoint: "http://litellm.agentic-system.svc:4000".to_string(),
            checkpoint_dsn: "postgres://agentic@postgres.agentic-system.svc:5432/checkpoints"
                .to_string(),
            default_target_urls: vec!["https://example.com".to_string()],
        }
    }
}

/// One logical parameter value before it is put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(String),
    Structured(Value),
}

impl ParameterValue {
    pub fn to_wire(&self) -> String {
        match self {
            ParameterValue::Scalar(s) => s.clone(),
            ParameterValue::Structured(v) => encode_json(v),
        }
    }
}

/// Encode a structured parameter value.
///
/// A `serde_json::Value` has string keys only, so encoding cannot fail;
/// this is the one place allowed to abort on an impossible error.
fn encode_json(value: &Value) -> String {
    serde_json::to_string(value).expect("serde_json::Value always serializes")
}

/// `{name, value}` entry of `spec.arguments.parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// The parameter bundle for one workload.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowParams {
    pub job_id: String,
    pub target_urls: Vec<String>,
    pub artifact_bucket: String,
    pub agent_image: String,
    pub engine_endpoint: String,
    pub llm_endpoint: String,
    pub checkpoint_dsn: String,
}

impl WorkflowParams {
    pub fn for_workload(workload: &AgentWorkload, defaults: &WorkflowDefaults) -> Self {
        let target_urls = if workload.spec.target_urls.is_empty() {
            defaults.default_target_urls.clone()
        } else {
            workload.spec.target_urls.clone()
        };
        Self {
            job_id: workload.metadata.name.clone(),
            target_urls,
            artifact_bucket: defaults.artifact_bucket.clone(),
            agent_image: defaults.agent_image.clone(),
            engine_endpoint: workload.spec.engine_endpoint.clone(),
            llm_endpoint: defaults.llm_endpoint.clone(),
            checkpoint_dsn: defaults.checkpoint_dsn.clone(),
        }
    }

    /// Ordered template parameters.
    pub fn to_parameters(&self) -> Vec<Parameter> {
        let entries = [
            ("job_id", ParameterValue::Scalar(self.job_id.clone())),
            (
                "target_urls",
                ParameterValue::Structured(Value::from(self.target_urls.clone())),
            ),
            (
                "minio_bucket",
                ParameterValue::Scalar(self.artifact_bucket.clone()),
            ),
            ("agent_image", ParameterValue::Scalar(self.agent_image.clone())),
            (
                "browserless_url",
                ParameterValue::Scalar(self.engine_endpoint.clone()),
            ),
            ("litellm_url", ParameterValue::Scalar(self.llm_endpoint.clone())),
            (
                "postgres_dsn",
                ParameterValue::Scalar(self.checkpoint_dsn.clone()),
            ),
        ];
        entries
            .into_iter()
            .map(|(name, value)| Parameter {
                name: name.to_string(),
                value: value.to_wire(),
            })
            .collect()
    }
}
