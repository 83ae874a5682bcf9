//! Typed model of the external engine's `Workflow` object.
//!
//! Only the fields the control plane writes or reads are modelled; the
//! engine owns everything else.

use super::params::{Parameter, WorkflowDefaults, WorkflowParams};
use crate::core::error::{FieldError, ValidationError};
use crate::core::meta::ObjectMeta;
use crate::workload::AgentWorkload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const WORKFLOW_API_VERSION: &str = "argoproj.io/v1alpha1";
pub const WORKFLOW_KIND: &str = "Workflow";
pub const WORKFLOW_TEMPLATE_KIND: &str = "WorkflowTemplate";

/// Condition type the engine sets while a workflow waits for a signal.
pub const SUSPENDED_CONDITION: &str = "Suspended";

pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_PART_OF: &str = "app.kubernetes.io/part-of";
pub const LABEL_JOB_ID: &str = "job-id";
pub const LABEL_SOURCE_NAMESPACE: &str = "conductor.agentic.io/source-namespace";
pub const LABEL_SOURCE_NAME: &str = "conductor.agentic.io/source-name";
pub const MANAGER_NAME: &str = "agentic-conductor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    pub workflow_template_ref: TemplateRef,
    #[serde(default)]
    pub arguments: Arguments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub node_type: String,
}

/// Status as written by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<WorkflowCondition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<String, WorkflowNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: WorkflowSpec,
    #[serde(default)]
    pub status: WorkflowStatus,
}

impl Workflow {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Status merge-patch that lifts the suspension.
    ///
    /// Merge patches replace lists wholesale, so the patch carries the
    /// current conditions minus `Suspended`; the others survive.
    pub fn resume_patch(&self) -> Value {
        let remaining: Vec<&WorkflowCondition> = self
            .status
            .conditions
            .iter()
            .filter(|c| c.condition_type != SUSPENDED_CONDITION)
            .collect();
        json!({ "status": { "conditions": remaining } })
    }
}

/// The workflow template referenced by created workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
}

/// Build the workflow object for `workload`.
///
/// The workflow shares the workload's name, lives in the configured
/// workflows namespace and is controlled by the workload.
pub fn build_workflow(
    workload: &AgentWorkload,
    defaults: &WorkflowDefaults,
) -> Result<Workflow, ValidationError> {
    let mut errors = ValidationError::default();
    if workload.metadata.name.is_empty() {
        errors.push(FieldError::new("metadata.name", "required to create a workflow"));
    }
    if workload.metadata.namespace.is_empty() {
        errors.push(FieldError::new(
            "metadata.namespace",
            "required to create a workflow",
        ));
    }
    errors.into_result()?;

    let name = workload.metadata.name.clone();
    let labels = BTreeMap::from([
        (LABEL_NAME.to_string(), defaults.template.clone()),
        (LABEL_MANAGED_BY.to_string(), MANAGER_NAME.to_string()),
        (LABEL_PART_OF.to_string(), MANAGER_NAME.to_string()),
        (LABEL_JOB_ID.to_string(), name.clone()),
        (
            LABEL_SOURCE_NAMESPACE.to_string(),
            workload.metadata.namespace.clone(),
        ),
        (LABEL_SOURCE_NAME.to_string(), name.clone()),
    ]);

    let mut metadata = ObjectMeta::new(defaults.namespace.clone(), name);
    metadata.labels = labels;
    metadata.owner_references = vec![workload.owner_reference()];

    Ok(Workflow {
        api_version: WORKFLOW_API_VERSION.to_string(),
        kind: WORKFLOW_KIND.to_string(),
        metadata,
        spec: WorkflowSpec {
            workflow_template_ref: TemplateRef {
                name: defaults.template.clone(),
            },
            arguments: Arguments {
                parameters: WorkflowParams::for_workload(workload, defaults).to_parameters(),
            },
        },
        status: WorkflowStatus::default(),
    })
}
