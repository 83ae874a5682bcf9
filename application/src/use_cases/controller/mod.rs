//! Controller runtime
//!
//! Feeds resource keys to a pool of reconcile workers:
//!
//! ```text
//! resync (list all) ──► WorkQueue ──► worker × N ──► reconcile
//!                          ▲                            │
//!                          └──── requeue policy ◄───────┘
//! ```
//!
//! A key is never reconciled by two workers at once. Errors are mapped
//! through [`RequeuePolicy::for_error`] and never stop the loop.

pub mod work_queue;

pub use work_queue::WorkQueue;

use super::reconcile_proposal::ReconcileProposalUseCase;
use super::reconcile_workload::ReconcileWorkloadUseCase;
use super::shared::{ReconcileError, RequeuePolicy};
use crate::config::ControllerParams;
use crate::ports::cluster::{ResourceStore, WorkflowEngine};
use crate::ports::plan_executor::PlanExecutor;
use conductor_domain::{ResourceKey, ResourceKind};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

pub struct Controller<S, E, X>
where
    S: ResourceStore + 'static,
    E: WorkflowEngine + 'static,
    X: PlanExecutor + 'static,
{
    store: Arc<S>,
    workloads: ReconcileWorkloadUseCase<S, E>,
    proposals: ReconcileProposalUseCase<S, X>,
    params: ControllerParams,
}

impl<S, E, X> Controller<S, E, X>
where
    S: ResourceStore + 'static,
    E: WorkflowEngine + 'static,
    X: PlanExecutor + 'static,
{
    pub fn new(
        store: Arc<S>,
        workloads: ReconcileWorkloadUseCase<S, E>,
        proposals: ReconcileProposalUseCase<S, X>,
        params: ControllerParams,
    ) -> Self {
        Self {
            store,
            workloads,
            proposals,
            params,
        }
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    /// Reconcile one key, outside the queue.
    pub async fn reconcile(
        &self,
        key: &ResourceKey,
        cancel: &CancellationToken,
    ) -> Result<RequeuePolicy, ReconcileError> {
        match key.kind {
            ResourceKind::AgentWorkload => {
                self.workloads
                    .reconcile(&key.namespace, &key.name, cancel)
                    .await
            }
            ResourceKind::AgenticProposal => {
                self.proposals
                    .reconcile(&key.namespace, &key.name, cancel)
                    .await
            }
        }
    }

    /// Enqueue every workload and proposal the store knows about.
    pub async fn resync(&self, queue: &WorkQueue) -> usize {
        let mut enqueued = 0;
        match self.store.list_workloads(None).await {
            Ok(workloads) => {
                for w in &workloads {
                    queue.add(w.key()).await;
                }
                enqueued += workloads.len();
            }
            Err(e) => warn!(error = %e, "Listing workloads failed"),
        }
        match self.store.list_proposals(None).await {
            Ok(proposals) => {
                for p in &proposals {
                    queue.add(p.key()).await;
                }
                enqueued += proposals.len();
            }
            Err(e) => warn!(error = %e, "Listing proposals failed"),
        }
        debug!(enqueued, "Resync");
        enqueued
    }

    /// Run until `shutdown` fires. In-flight reconciles see the same token
    /// and stop at their next external call.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            workers = self.params.workers,
            resync_secs = self.params.resync_interval.as_secs(),
            "Controller starting"
        );

        if let Err(e) = self.workloads.lifecycle().validate_template(&shutdown).await {
            error!(
                error = %e,
                "Workflow template check failed; workloads will back off until it exists"
            );
        }

        let queue = WorkQueue::new(self.params.backoff, shutdown.clone());
        let mut tasks = JoinSet::new();

        {
            let controller = Arc::clone(&self);
            let queue = Arc::clone(&queue);
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                let mut ticker = tokio::time::interval(controller.params.resync_interval);
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            controller.resync(&queue).await;
                        }
                    }
                }
            });
        }

        for worker in 0..self.params.workers.max(1) {
            let controller = Arc::clone(&self);
            let queue = Arc::clone(&queue);
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                while let Some(key) = queue.next().await {
                    controller.process(&queue, &key, &shutdown).await;
                    queue.done(&key).await;
                }
                debug!(worker, "Worker stopped");
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Controller task panicked");
            }
        }
        info!("Controller stopped");
    }

    async fn process(&self, queue: &Arc<WorkQueue>, key: &ResourceKey, cancel: &CancellationToken) {
        let span = info_span!(
            "reconcile",
            kind = key.kind.as_str(),
            namespace = %key.namespace,
            name = %key.name
        );
        let result = self.reconcile(key, cancel).instrument(span.clone()).await;

        let requeue = match result {
            Ok(policy) => policy,
            Err(ReconcileError::Cancelled(_)) => return,
            Err(e) => {
                let kind = e.kind();
                span.in_scope(|| warn!(error = %e, kind = kind.as_str(), "Reconcile failed"));
                RequeuePolicy::for_error(kind)
            }
        };

        match requeue {
            RequeuePolicy::Never => queue.forget(key).await,
            RequeuePolicy::Immediate => {
                queue.forget(key).await;
                queue.add(key.clone()).await;
            }
            RequeuePolicy::After(delay) => {
                queue.forget(key).await;
                queue.add_after(key.clone(), delay);
            }
            RequeuePolicy::Backoff => {
                let delay = queue.backoff(key.clone()).await;
                span.in_scope(|| debug!(delay_ms = delay.as_millis() as u64, "Backing off"));
            }
        }
    }
}
