//! Workflow lifecycle manager
//!
//! Materialises a workload as a workflow on the external engine, observes
//! it, and resumes it once the gated actions have been admitted. Every
//! operation races the caller's cancellation token.

use super::shared::{Cancelled, cancellable, check_cancelled};
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger, WORKFLOW_CREATED};
use crate::ports::cluster::{ClusterError, WorkflowEngine};
use conductor_domain::workflow::{WorkflowTemplate, build_workflow};
use conductor_domain::{
    AgentWorkload, ErrorKind, ValidationError, Workflow, WorkflowDefaults, WorkflowState,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Cannot build workflow: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Workflow template {name} is missing: {source}")]
    TemplateMissing { name: String, source: ClusterError },

    #[error(transparent)]
    Engine(#[from] ClusterError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::Invalid(e) => e.kind(),
            LifecycleError::TemplateMissing { .. } => ErrorKind::NotFound,
            LifecycleError::Engine(e) => e.kind(),
            LifecycleError::Cancelled(_) => ErrorKind::Transient,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LifecycleError::Engine(e) if e.is_not_found())
    }
}

/// Result of [`WorkflowLifecycleManager::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Workflow),
    /// A workflow with this name was already there; treated as success.
    AlreadyExisted(Workflow),
}

impl CreateOutcome {
    pub fn workflow(&self) -> &Workflow {
        match self {
            CreateOutcome::Created(wf) | CreateOutcome::AlreadyExisted(wf) => wf,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

pub struct WorkflowLifecycleManager<E: WorkflowEngine + 'static> {
    engine: Arc<E>,
    defaults: WorkflowDefaults,
    audit: Arc<dyn AuditLogger>,
}

impl<E: WorkflowEngine + 'static> WorkflowLifecycleManager<E> {
    pub fn new(engine: Arc<E>, defaults: WorkflowDefaults) -> Self {
        Self {
            engine,
            defaults,
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn defaults(&self) -> &WorkflowDefaults {
        &self.defaults
    }

    /// Create the workflow for `workload`.
    pub async fn create(
        &self,
        workload: &AgentWorkload,
        cancel: &CancellationToken,
    ) -> Result<CreateOutcome, LifecycleError> {
        check_cancelled::<LifecycleError>(cancel)?;
        let workflow = build_workflow(workload, &self.defaults)?;

        let result = cancellable(cancel, async {
            self.engine
                .create_workflow(&workflow)
                .await
                .map_err(LifecycleError::from)
        })
        .await;

        match result {
            Ok(created) => {
                info!(
                    workflow = %created.name(),
                    namespace = %created.namespace(),
                    template = %self.defaults.template,
                    "Created workflow"
                );
                self.audit.log(AuditEvent::new(
                    WORKFLOW_CREATED,
                    json!({
                        "workload": workload.key().to_string(),
                        "workflow": created.name(),
                        "namespace": created.namespace(),
                        "template": self.defaults.template,
                    }),
                ));
                Ok(CreateOutcome::Created(created))
            }
            Err(LifecycleError::Engine(ClusterError::AlreadyExists { .. })) => {
                debug!(workflow = %workflow.name(), "Workflow already exists");
                Ok(CreateOutcome::AlreadyExisted(workflow))
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the workflow and project its status.
    pub async fn observe(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(Workflow, WorkflowState), LifecycleError> {
        let workflow = cancellable(cancel, async {
            self.engine
                .get_workflow(namespace, name)
                .await
                .map_err(LifecycleError::from)
        })
        .await?;
        let state = workflow.state();
        debug!(
            workflow = %name,
            phase = %state.phase,
            suspended = state.suspended,
            "Observed workflow"
        );
        Ok((workflow, state))
    }

    /// Clear the `Suspended` condition. Engine errors come back unchanged.
    pub async fn resume(
        &self,
        workflow: &Workflow,
        cancel: &CancellationToken,
    ) -> Result<Workflow, LifecycleError> {
        let patch = workflow.resume_patch();
        let resumed = cancellable(cancel, async {
            self.engine
                .patch_workflow_status(workflow.namespace(), workflow.name(), &patch)
                .await
                .map_err(LifecycleError::from)
        })
        .await?;
        info!(workflow = %workflow.name(), "Resumed workflow");
        Ok(resumed)
    }

    /// Check that the configured template exists in the workflows namespace.
    pub async fn validate_template(
        &self,
        cancel: &CancellationToken,
    ) -> Result<WorkflowTemplate, LifecycleError> {
        let name = self.defaults.template.clone();
        let namespace = self.defaults.namespace.clone();
        let result = cancellable(cancel, async {
            self.engine
                .get_template(&namespace, &name)
                .await
                .map_err(LifecycleError::from)
        })
        .await;
        match result {
            Err(LifecycleError::Engine(source)) if source.is_not_found() => {
                Err(LifecycleError::TemplateMissing { name, source })
            }
            other => other,
        }
    }
}
