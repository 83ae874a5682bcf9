//! In-crate fakes of the ports, shared by the use-case tests.

use crate::ports::audit_logger::{AuditEvent, AuditLogger};
use crate::ports::cluster::{ClusterError, ResourceStore, WorkflowEngine};
use async_trait::async_trait;
use conductor_domain::workflow::{
    WORKFLOW_KIND, WORKFLOW_TEMPLATE_KIND, WorkflowStatus, WorkflowTemplate,
};
use conductor_domain::{AgentWorkload, AgenticProposal, ObjectMeta, Workflow};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    workloads: HashMap<Key, AgentWorkload>,
    proposals: HashMap<Key, AgenticProposal>,
    workflows: HashMap<Key, Workflow>,
    templates: HashMap<Key, WorkflowTemplate>,
    version: u64,
    injected_conflicts: u32,
    patches: u32,
}

impl State {
    fn next_version(&mut self) -> Option<String> {
        self.version += 1;
        Some(self.version.to_string())
    }
}

/// Cluster store and workflow engine backed by hash maps, with
/// resource-version checks on status writes.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_workload(&self, mut workload: AgentWorkload) -> AgentWorkload {
        let mut state = self.state.lock().unwrap();
        workload.metadata.resource_version = state.next_version();
        state.workloads.insert(
            key(workload.namespace(), workload.name()),
            workload.clone(),
        );
        workload
    }

    pub fn insert_proposal(&self, mut proposal: AgenticProposal) -> AgenticProposal {
        let mut state = self.state.lock().unwrap();
        proposal.metadata.resource_version = state.next_version();
        state.proposals.insert(
            key(proposal.namespace(), proposal.name()),
            proposal.clone(),
        );
        proposal
    }

    pub fn workload(&self, namespace: &str, name: &str) -> Option<AgentWorkload> {
        self.state.lock().unwrap().workloads.get(&key(namespace, name)).cloned()
    }

    pub fn proposal(&self, namespace: &str, name: &str) -> Option<AgenticProposal> {
        self.state.lock().unwrap().proposals.get(&key(namespace, name)).cloned()
    }

    pub fn workflow(&self, namespace: &str, name: &str) -> Option<Workflow> {
        self.state.lock().unwrap().workflows.get(&key(namespace, name)).cloned()
    }

    pub fn remove_workflow(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().workflows.remove(&key(namespace, name));
    }

    pub fn add_template(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().templates.insert(
            key(namespace, name),
            WorkflowTemplate {
                api_version: conductor_domain::workflow::WORKFLOW_API_VERSION.to_string(),
                kind: WORKFLOW_TEMPLATE_KIND.to_string(),
                metadata: ObjectMeta::new(namespace, name),
            },
        );
    }

    /// Simulate the engine progressing a workflow.
    pub fn set_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        update: impl FnOnce(&mut WorkflowStatus),
    ) {
        if let Some(wf) = self
            .state
            .lock()
            .unwrap()
            .workflows
            .get_mut(&key(namespace, name))
        {
            update(&mut wf.status);
        }
    }

    /// The next `count` status writes fail with a conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.state.lock().unwrap().injected_conflicts = count;
    }

    pub fn patch_count(&self) -> u32 {
        self.state.lock().unwrap().patches
    }
}

fn take_conflict(
    state: &mut State,
    kind: &str,
    namespace: &str,
    name: &str,
) -> Result<(), ClusterError> {
    if state.injected_conflicts > 0 {
        state.injected_conflicts -= 1;
        return Err(ClusterError::conflict(kind, namespace, name));
    }
    Ok(())
}

fn check_version(
    stored: &ObjectMeta,
    incoming: &ObjectMeta,
    kind: &str,
) -> Result<(), ClusterError> {
    match &incoming.resource_version {
        Some(v) if Some(v) != stored.resource_version.as_ref() => Err(ClusterError::conflict(
            kind,
            &incoming.namespace,
            &incoming.name,
        )),
        _ => Ok(()),
    }
}

fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (k, v) in patch {
                if v.is_null() {
                    target.remove(k);
                } else {
                    merge(target.entry(k.clone()).or_insert(Value::Null), v);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait]
impl ResourceStore for FakeCluster {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgentWorkload, ClusterError> {
        self.workload(namespace, name)
            .ok_or_else(|| ClusterError::not_found("AgentWorkload", namespace, name))
    }

    async fn list_workloads(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgentWorkload>, ClusterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .workloads
            .values()
            .filter(|w| namespace.is_none_or(|ns| w.namespace() == ns))
            .cloned()
            .collect())
    }

    async fn update_workload_status(
        &self,
        workload: &AgentWorkload,
    ) -> Result<AgentWorkload, ClusterError> {
        let mut state = self.state.lock().unwrap();
        take_conflict(&mut state, "AgentWorkload", workload.namespace(), workload.name())?;
        let k = key(workload.namespace(), workload.name());
        let Some(stored) = state.workloads.get(&k) else {
            return Err(ClusterError::not_found("AgentWorkload", &k.0, &k.1));
        };
        check_version(&stored.metadata, &workload.metadata, "AgentWorkload")?;
        let version = state.next_version();
        let Some(stored) = state.workloads.get_mut(&k) else {
            return Err(ClusterError::not_found("AgentWorkload", &k.0, &k.1));
        };
        stored.status = workload.status.clone();
        stored.metadata.resource_version = version;
        Ok(stored.clone())
    }

    async fn get_proposal(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgenticProposal, ClusterError> {
        self.proposal(namespace, name)
            .ok_or_else(|| ClusterError::not_found("AgenticProposal", namespace, name))
    }

    async fn list_proposals(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgenticProposal>, ClusterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .proposals
            .values()
            .filter(|p| namespace.is_none_or(|ns| p.namespace() == ns))
            .cloned()
            .collect())
    }

    async fn update_proposal_status(
        &self,
        proposal: &AgenticProposal,
    ) -> Result<AgenticProposal, ClusterError> {
        let mut state = self.state.lock().unwrap();
        take_conflict(&mut state, "AgenticProposal", proposal.namespace(), proposal.name())?;
        let k = key(proposal.namespace(), proposal.name());
        let Some(stored) = state.proposals.get(&k) else {
            return Err(ClusterError::not_found("AgenticProposal", &k.0, &k.1));
        };
        check_version(&stored.metadata, &proposal.metadata, "AgenticProposal")?;
        let version = state.next_version();
        let Some(stored) = state.proposals.get_mut(&k) else {
            return Err(ClusterError::not_found("AgenticProposal", &k.0, &k.1));
        };
        stored.status = proposal.status.clone();
        stored.metadata.resource_version = version;
        Ok(stored.clone())
    }
}

#[async_trait]
impl WorkflowEngine for FakeCluster {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow, ClusterError> {
        let mut state = self.state.lock().unwrap();
        let k = key(workflow.namespace(), workflow.name());
        if state.workflows.contains_key(&k) {
            return Err(ClusterError::already_exists(WORKFLOW_KIND, &k.0, &k.1));
        }
        let mut created = workflow.clone();
        created.metadata.resource_version = state.next_version();
        state.workflows.insert(k, created.clone());
        Ok(created)
    }

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, ClusterError> {
        self.workflow(namespace, name)
            .ok_or_else(|| ClusterError::not_found(WORKFLOW_KIND, namespace, name))
    }

    async fn patch_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Workflow, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.patches += 1;
        let Some(wf) = state.workflows.get(&key(namespace, name)) else {
            return Err(ClusterError::not_found(WORKFLOW_KIND, namespace, name));
        };
        let mut doc = serde_json::to_value(wf).map_err(|e| ClusterError::Fatal(e.to_string()))?;
        merge(&mut doc, patch);
        let patched: Workflow =
            serde_json::from_value(doc).map_err(|e| ClusterError::Rejected(e.to_string()))?;
        state.workflows.insert(key(namespace, name), patched.clone());
        Ok(patched)
    }

    async fn get_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkflowTemplate, ClusterError> {
        self.state
            .lock()
            .unwrap()
            .templates
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::not_found(WORKFLOW_TEMPLATE_KIND, namespace, name))
    }
}

/// Audit logger that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

impl AuditLogger for RecordingAudit {
    fn log(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
