//! The `AgentWorkload` resource.

use super::action::{Action, Approval};
use crate::core::condition::Conditions;
use crate::core::error::FieldError;
use crate::core::meta::{API_VERSION, ObjectMeta, OwnerReference, ResourceKey, ResourceKind};
use crate::policy::PolicyMode;
use crate::proposal::AgenticProposal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub const WORKLOAD_KIND: &str = "AgentWorkload";

/// Infrastructure the workload's agents operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadType {
    #[default]
    Generic,
    Ceph,
    Minio,
    Postgres,
    Aws,
    Kubernetes,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 6] = [
        WorkloadType::Generic,
        WorkloadType::Ceph,
        WorkloadType::Minio,
        WorkloadType::Postgres,
        WorkloadType::Aws,
        WorkloadType::Kubernetes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadType::Generic => "generic",
            WorkloadType::Ceph => "ceph",
            WorkloadType::Minio => "minio",
            WorkloadType::Postgres => "postgres",
            WorkloadType::Aws => "aws",
            WorkloadType::Kubernetes => "kubernetes",
        }
    }
}

impl std::fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkloadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown workload type: {}. Valid: generic, ceph, minio, postgres, aws, kubernetes",
                    s
                )
            })
    }
}

/// Desired state, kept as written so admission can report every bad field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    #[serde(rename = "type", default)]
    pub workload_type: String,
    #[serde(default)]
    pub engine_endpoint: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(
        default,
        deserialize_with = "threshold_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_approve_threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_urls: Vec<String>,
}

/// Accept `0.95` as well as `"0.95"`, keeping the text for the pattern check.
fn threshold_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

impl WorkloadSpec {
    pub fn parse_type(&self) -> Result<WorkloadType, FieldError> {
        self.workload_type
            .parse()
            .map_err(|e: String| FieldError::new("spec.type", e))
    }

    /// Threshold as a number; unset means the default.
    pub fn parse_auto_approve_threshold(&self) -> Result<f64, FieldError> {
        match self.auto_approve_threshold.as_deref() {
            None => Ok(super::validation::DEFAULT_AUTO_APPROVE_THRESHOLD),
            Some(text) => text.parse::<f64>().map_err(|e| {
                FieldError::new(
                    "spec.autoApproveThreshold",
                    format!("{:?} is not a number: {}", text, e),
                )
            }),
        }
    }

    /// Only `strict` and `permissive` may be declared on a workload.
    pub fn parse_policy_mode(&self) -> Result<PolicyMode, FieldError> {
        match self.policy_mode.as_deref() {
            None => Ok(PolicyMode::Strict),
            Some("strict") => Ok(PolicyMode::Strict),
            Some("permissive") => Ok(PolicyMode::Permissive),
            Some(other) => Err(FieldError::new(
                "spec.policyMode",
                format!("Unknown policy mode: {}. Valid: strict, permissive", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkloadPhase {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkloadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadPhase::Pending => "Pending",
            WorkloadPhase::Running => "Running",
            WorkloadPhase::Completed => "Completed",
            WorkloadPhase::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkloadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatus {
    #[serde(default)]
    pub phase: WorkloadPhase,
    #[serde(default)]
    pub proposed_actions: Vec<Action>,
    #[serde(default)]
    pub executed_actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconcile_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    /// 0..100, reported by the workload's agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_health: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// The proposal whose approval last resumed the workflow. An approval
    /// resumes one suspension only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_proposal: Option<AppliedProposal>,
}

/// Identity of a proposal that has been spent on a resume.
///
/// The uid tells a recreated proposal of the same name apart; the
/// resourceVersion is not used because the proposal keeps moving through
/// `Executing` and `Completed` after it resumed the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedProposal {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

impl AppliedProposal {
    pub fn of(proposal: &AgenticProposal) -> Self {
        Self {
            name: proposal.metadata.name.clone(),
            uid: proposal.metadata.uid.clone(),
        }
    }

    pub fn matches(&self, proposal: &AgenticProposal) -> bool {
        self.name == proposal.metadata.name && self.uid == proposal.metadata.uid
    }
}

impl WorkloadStatus {
    /// Whether `proposal` already resumed this workload's workflow.
    pub fn has_applied(&self, proposal: &AgenticProposal) -> bool {
        self.applied_proposal
            .as_ref()
            .is_some_and(|applied| applied.matches(proposal))
    }

    /// Proposed actions nobody has decided on yet.
    pub fn pending_actions(&self) -> impl Iterator<Item = &Action> {
        self.proposed_actions
            .iter()
            .filter(|a| a.approved == Approval::Unset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentWorkload {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
    #[serde(default)]
    pub status: WorkloadStatus,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    WORKLOAD_KIND.to_string()
}

impl AgentWorkload {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: WorkloadSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(namespace, name),
            spec,
            status: WorkloadStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(
            ResourceKind::AgentWorkload,
            &self.metadata.namespace,
            &self.metadata.name,
        )
    }

    /// Controller reference placed on objects this workload owns.
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: API_VERSION.to_string(),
            kind: WORKLOAD_KIND.to_string(),
            name: self.metadata.name.clone(),
            uid: self.metadata.uid.clone(),
            controller: true,
            block_owner_deletion: true,
        }
    }

    /// Completed or Failed for the current generation. Only a spec change
    /// wakes it up again.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status.phase,
            WorkloadPhase::Completed | WorkloadPhase::Failed
        ) && self.status.observed_generation == self.metadata.generation
    }
}
