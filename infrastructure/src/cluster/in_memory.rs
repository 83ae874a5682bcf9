//! Process-local cluster.
//!
//! Backs `--backend memory` and the integration tests. It keeps the two
//! properties the controller relies on: every write bumps a
//! `resourceVersion` and a status write carrying a stale one is refused,
//! and deleting a workload deletes the workflows it controls.

use super::merge_patch::apply_merge_patch;
use async_trait::async_trait;
use conductor_application::ports::clock::{Clock, SystemClock};
use conductor_application::ports::cluster::{ClusterError, ResourceStore, WorkflowEngine};
use conductor_domain::workflow::{
    WORKFLOW_API_VERSION, WORKFLOW_KIND, WORKFLOW_TEMPLATE_KIND, WorkflowStatus, WorkflowTemplate,
};
use conductor_domain::workload::WORKLOAD_KIND;
use conductor_domain::proposal::PROPOSAL_KIND;
use conductor_domain::{AgentWorkload, AgenticProposal, ObjectMeta, Workflow};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct Store {
    workloads: BTreeMap<Key, AgentWorkload>,
    proposals: BTreeMap<Key, AgenticProposal>,
    workflows: BTreeMap<Key, Workflow>,
    templates: BTreeMap<Key, WorkflowTemplate>,
    revision: u64,
}

impl Store {
    fn bump(&mut self) -> Option<String> {
        self.revision += 1;
        Some(self.revision.to_string())
    }

    fn uid(&self) -> String {
        format!("mem-{:012x}", self.revision)
    }
}

/// Check a write against the stored `resourceVersion`. A write without one
/// is unconditional.
fn check_version(
    stored: &ObjectMeta,
    incoming: &ObjectMeta,
    kind: &str,
) -> Result<(), ClusterError> {
    match &incoming.resource_version {
        Some(v) if stored.resource_version.as_ref() != Some(v) => Err(ClusterError::conflict(
            kind,
            &incoming.namespace,
            &incoming.name,
        )),
        _ => Ok(()),
    }
}

/// Carry server-owned metadata over to an applied object.
fn merge_meta(
    stored: Option<&ObjectMeta>,
    incoming: &mut ObjectMeta,
    spec_changed: bool,
    now: chrono::DateTime<chrono::Utc>,
    uid: String,
) {
    match stored {
        Some(stored) => {
            incoming.uid = stored.uid.clone();
            incoming.creation_timestamp = stored.creation_timestamp;
            incoming.generation = if spec_changed {
                stored.generation + 1
            } else {
                stored.generation
            };
        }
        None => {
            if incoming.uid.is_empty() {
                incoming.uid = uid;
            }
            incoming.creation_timestamp.get_or_insert(now);
            incoming.generation = 1;
        }
    }
}

pub struct InMemoryCluster {
    store: RwLock<Store>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create or update a workload the way `kubectl apply` would: the
    /// status is kept and the generation moves when the spec changes.
    pub async fn apply_workload(&self, mut workload: AgentWorkload) -> AgentWorkload {
        let mut store = self.store.write().await;
        let k = key(workload.namespace(), workload.name());
        let uid = store.uid();
        let stored = store.workloads.get(&k);
        let spec_changed = stored.is_none_or(|s| s.spec != workload.spec);
        merge_meta(
            stored.map(|s| &s.metadata),
            &mut workload.metadata,
            spec_changed,
            self.clock.now(),
            uid,
        );
        if let Some(stored) = stored {
            workload.status = stored.status.clone();
        }
        workload.metadata.resource_version = store.bump();
        debug!(
            namespace = %k.0,
            name = %k.1,
            generation = workload.metadata.generation,
            "Workload applied"
        );
        store.workloads.insert(k, workload.clone());
        workload
    }

    pub async fn apply_proposal(&self, mut proposal: AgenticProposal) -> AgenticProposal {
        let mut store = self.store.write().await;
        let k = key(proposal.namespace(), proposal.name());
        let uid = store.uid();
        let stored = store.proposals.get(&k);
        let spec_changed = stored.is_none_or(|s| s.spec != proposal.spec);
        merge_meta(
            stored.map(|s| &s.metadata),
            &mut proposal.metadata,
            spec_changed,
            self.clock.now(),
            uid,
        );
        if let Some(stored) = stored {
            proposal.status = stored.status.clone();
        }
        proposal.metadata.resource_version = store.bump();
        store.proposals.insert(k, proposal.clone());
        proposal
    }

    /// Delete a workload and every workflow it controls.
    pub async fn delete_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let mut store = self.store.write().await;
        let Some(removed) = store.workloads.remove(&key(namespace, name)) else {
            return Err(ClusterError::not_found(WORKLOAD_KIND, namespace, name));
        };
        let uid = removed.metadata.uid;
        let before = store.workflows.len();
        store
            .workflows
            .retain(|_, wf| !wf.metadata.owner_references.iter().any(|r| r.uid == uid));
        debug!(
            namespace,
            name,
            cascaded = before - store.workflows.len(),
            "Workload deleted"
        );
        Ok(())
    }

    pub async fn delete_proposal(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.store
            .write()
            .await
            .proposals
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::not_found(PROPOSAL_KIND, namespace, name))
    }

    pub async fn add_template(&self, namespace: &str, name: &str) {
        self.store.write().await.templates.insert(
            key(namespace, name),
            WorkflowTemplate {
                api_version: WORKFLOW_API_VERSION.to_string(),
                kind: WORKFLOW_TEMPLATE_KIND.to_string(),
                metadata: ObjectMeta::new(namespace, name),
            },
        );
    }

    pub async fn workflows(&self) -> Vec<Workflow> {
        self.store.read().await.workflows.values().cloned().collect()
    }

    /// Stand in for the engine moving a workflow along.
    pub async fn update_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        update: impl FnOnce(&mut WorkflowStatus),
    ) -> Result<Workflow, ClusterError> {
        let mut store = self.store.write().await;
        let version = store.bump();
        let Some(wf) = store.workflows.get_mut(&key(namespace, name)) else {
            return Err(ClusterError::not_found(WORKFLOW_KIND, namespace, name));
        };
        update(&mut wf.status);
        wf.metadata.resource_version = version;
        Ok(wf.clone())
    }
}

#[async_trait]
impl ResourceStore for InMemoryCluster {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgentWorkload, ClusterError> {
        self.store
            .read()
            .await
            .workloads
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::not_found(WORKLOAD_KIND, namespace, name))
    }

    async fn list_workloads(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgentWorkload>, ClusterError> {
        Ok(self
            .store
            .read()
            .await
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
        let mut store = self.store.write().await;
        let k = key(workload.namespace(), workload.name());
        let Some(stored) = store.workloads.get(&k) else {
            return Err(ClusterError::not_found(WORKLOAD_KIND, &k.0, &k.1));
        };
        check_version(&stored.metadata, &workload.metadata, WORKLOAD_KIND)?;
        let version = store.bump();
        let Some(stored) = store.workloads.get_mut(&k) else {
            return Err(ClusterError::not_found(WORKLOAD_KIND, &k.0, &k.1));
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
        self.store
            .read()
            .await
            .proposals
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::not_found(PROPOSAL_KIND, namespace, name))
    }

    async fn list_proposals(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgenticProposal>, ClusterError> {
        Ok(self
            .store
            .read()
            .await
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
        let mut store = self.store.write().await;
        let k = key(proposal.namespace(), proposal.name());
        let Some(stored) = store.proposals.get(&k) else {
            return Err(ClusterError::not_found(PROPOSAL_KIND, &k.0, &k.1));
        };
        check_version(&stored.metadata, &proposal.metadata, PROPOSAL_KIND)?;
        let version = store.bump();
        let Some(stored) = store.proposals.get_mut(&k) else {
            return Err(ClusterError::not_found(PROPOSAL_KIND, &k.0, &k.1));
        };
        stored.status = proposal.status.clone();
        stored.metadata.resource_version = version;
        Ok(stored.clone())
    }
}

#[async_trait]
impl WorkflowEngine for InMemoryCluster {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow, ClusterError> {
        let mut store = self.store.write().await;
        let k = key(workflow.namespace(), workflow.name());
        if store.workflows.contains_key(&k) {
            return Err(ClusterError::already_exists(WORKFLOW_KIND, &k.0, &k.1));
        }
        let mut created = workflow.clone();
        created.metadata.uid = store.uid();
        created.metadata.creation_timestamp = Some(self.clock.now());
        created.metadata.resource_version = store.bump();
        store.workflows.insert(k, created.clone());
        Ok(created)
    }

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, ClusterError> {
        self.store
            .read()
            .await
            .workflows
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::not_found(WORKFLOW_KIND, namespace, name))
    }

    async fn patch_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Workflow, ClusterError> {
        let mut store = self.store.write().await;
        let k = key(namespace, name);
        let Some(current) = store.workflows.get(&k) else {
            return Err(ClusterError::not_found(WORKFLOW_KIND, namespace, name));
        };
        let mut doc =
            serde_json::to_value(current).map_err(|e| ClusterError::Fatal(e.to_string()))?;
        apply_merge_patch(&mut doc, patch);
        let mut patched: Workflow =
            serde_json::from_value(doc).map_err(|e| ClusterError::Rejected(e.to_string()))?;
        patched.metadata.resource_version = store.bump();
        store.workflows.insert(k, patched.clone());
        Ok(patched)
    }

    async fn get_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkflowTemplate, ClusterError> {
        self.store
            .read()
            .await
            .templates
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::not_found(WORKFLOW_TEMPLATE_KIND, namespace, name))
    }
}
