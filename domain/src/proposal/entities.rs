//! The `AgenticProposal` resource.

use crate::core::condition::Conditions;
use crate::core::confidence::Confidence;
use crate::core::meta::{API_VERSION, ObjectMeta, ResourceKey, ResourceKind};
use crate::quorum::{ConsensusThreshold, ProposalPhase, Vote, Voter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

pub const PROPOSAL_KIND: &str = "AgenticProposal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanType {
    CodeChange,
    GitopsSync,
    Webhook,
    Script,
    Manual,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::CodeChange => "code-change",
            PlanType::GitopsSync => "gitops-sync",
            PlanType::Webhook => "webhook",
            PlanType::Script => "script",
            PlanType::Manual => "manual",
        }
    }

    /// Parameter that must be present for this plan type.
    pub fn required_parameter(&self) -> Option<&'static str> {
        match self {
            PlanType::CodeChange => Some("repository"),
            PlanType::GitopsSync => Some("application"),
            PlanType::Webhook => Some("url"),
            PlanType::Script => Some("script"),
            PlanType::Manual => None,
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code-change" => Ok(PlanType::CodeChange),
            "gitops-sync" => Ok(PlanType::GitopsSync),
            "webhook" => Ok(PlanType::Webhook),
            "script" => Ok(PlanType::Script),
            "manual" => Ok(PlanType::Manual),
            _ => Err(format!(
                "Unknown plan type: {}. Valid: code-change, gitops-sync, webhook, script, manual",
                s
            )),
        }
    }
}

/// One step of an execution plan, gated by the policy evaluator on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub actions: Vec<PlannedAction>,
    /// Health figure to evaluate the actions against; falls back to the workload's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_health: Option<u8>,
}

impl ExecutionPlan {
    pub fn new(plan_type: PlanType) -> Self {
        Self {
            plan_type,
            parameters: Map::new(),
            actions: Vec::new(),
            cluster_health: None,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_action(mut self, action: PlannedAction) -> Self {
        self.actions.push(action);
        self
    }

    /// String parameter, if present and non-blank.
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedBy {
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSpec {
    pub title: String,
    pub description: String,
    pub proposed_by: ProposedBy,
    pub consensus_threshold: ConsensusThreshold,
    pub voters: Vec<Voter>,
    pub execution_plan: ExecutionPlan,
    /// Workload whose suspended workflow this proposal gates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_proposals: Vec<String>,
}

impl ProposalSpec {
    pub fn voter(&self, agent: &str) -> Option<&Voter> {
        self.voters.iter().find(|v| v.agent == agent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

impl ExecutionResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: String::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStatus {
    #[serde(default)]
    pub phase: ProposalPhase,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_score: Option<f64>,
    #[serde(default)]
    pub consensus_reached: bool,
    /// Agents whose votes no longer count because they left the roster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discarded_voters: Vec<String>,
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<ExecutionResult>,
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgenticProposal {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ProposalSpec,
    #[serde(default)]
    pub status: ProposalStatus,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    PROPOSAL_KIND.to_string()
}

impl AgenticProposal {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: ProposalSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(namespace, name),
            spec,
            status: ProposalStatus::default(),
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
            ResourceKind::AgenticProposal,
            &self.metadata.namespace,
            &self.metadata.name,
        )
    }

    /// Whether this proposal gates the named workload.
    pub fn gates(&self, workload: &str) -> bool {
        self.spec.workload_ref.as_deref() == Some(workload)
    }
}
