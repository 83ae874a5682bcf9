//! Cluster ports
//!
//! [`ResourceStore`] reads the declared resources and writes their status
//! sub-resource. [`WorkflowEngine`] talks to the external workflow engine.
//! Both go through the cluster's optimistic concurrency: a write carrying a
//! stale `resourceVersion` fails with [`ClusterError::Conflict`].

use async_trait::async_trait;
use conductor_domain::workflow::WorkflowTemplate;
use conductor_domain::{AgentWorkload, AgenticProposal, ErrorKind, Workflow};
use serde_json::Value;
use thiserror::Error;

/// Errors returned by cluster adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl ClusterError {
    pub fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        ClusterError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn already_exists(kind: &str, namespace: &str, name: &str) -> Self {
        ClusterError::AlreadyExists {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn conflict(kind: &str, namespace: &str, name: &str) -> Self {
        ClusterError::Conflict {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClusterError::NotFound { .. } => ErrorKind::NotFound,
            ClusterError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ClusterError::Conflict { .. } => ErrorKind::ConflictRetry,
            ClusterError::Rejected(_) => ErrorKind::ValidationFailed,
            ClusterError::Transient(_) => ErrorKind::Transient,
            ClusterError::Fatal(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict { .. })
    }
}

/// Access to `AgentWorkload` and `AgenticProposal` resources.
///
/// Status updates replace the status sub-resource only; the spec and
/// metadata of the passed object are ignored apart from its identity and
/// `resourceVersion`.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_workload(&self, namespace: &str, name: &str)
    -> Result<AgentWorkload, ClusterError>;

    /// All workloads, or those in `namespace` when given.
    async fn list_workloads(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgentWorkload>, ClusterError>;

    async fn update_workload_status(
        &self,
        workload: &AgentWorkload,
    ) -> Result<AgentWorkload, ClusterError>;

    async fn get_proposal(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgenticProposal, ClusterError>;

    async fn list_proposals(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgenticProposal>, ClusterError>;

    async fn update_proposal_status(
        &self,
        proposal: &AgenticProposal,
    ) -> Result<AgenticProposal, ClusterError>;
}

/// The external workflow engine.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Create `workflow`; an existing object with the same name yields
    /// [`ClusterError::AlreadyExists`].
    async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow, ClusterError>;

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, ClusterError>;

    /// Apply a JSON merge patch to the workflow's status.
    async fn patch_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Workflow, ClusterError>;

    async fn get_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkflowTemplate, ClusterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ClusterError::not_found("Workflow", "ns", "a").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ClusterError::conflict("Workflow", "ns", "a").kind(),
            ErrorKind::ConflictRetry
        );
        assert_eq!(
            ClusterError::Transient("timeout".into()).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ClusterError::already_exists("Workflow", "argo-workflows", "job-1").to_string(),
            "Workflow argo-workflows/job-1 already exists"
        );
    }
}
