//! Admission use case
//!
//! Defaulting and validation applied to `AgentWorkload` and
//! `AgenticProposal` objects on create and update. Deletion is always
//! admitted. The engine endpoint is probed for reachability, but a failed
//! probe only adds a warning.

use crate::ports::endpoint_probe::{EndpointProbe, NoEndpointProbe, ProbeOutcome};
use conductor_domain::proposal as proposals;
use conductor_domain::workload::{self as workloads, WorkloadStatus};
use conductor_domain::{AgentWorkload, AgenticProposal, ValidationError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOperation {
    Create,
    Update,
    Delete,
}

/// Result of an admitted request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionReview {
    /// Defaults were filled in.
    pub mutated: bool,
    /// Non-fatal findings shown to the caller.
    pub warnings: Vec<String>,
}

pub struct AdmissionUseCase<P: EndpointProbe + 'static = NoEndpointProbe> {
    probe: Arc<P>,
    probe_timeout: Duration,
}

impl AdmissionUseCase<NoEndpointProbe> {
    /// Admission without reachability probing.
    pub fn without_probe() -> Self {
        Self::new(Arc::new(NoEndpointProbe))
    }
}

impl<P: EndpointProbe + 'static> AdmissionUseCase<P> {
    pub fn new(probe: Arc<P>) -> Self {
        Self {
            probe,
            probe_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub async fn admit_workload(
        &self,
        operation: AdmissionOperation,
        workload: &mut AgentWorkload,
    ) -> Result<AdmissionReview, ValidationError> {
        if operation == AdmissionOperation::Delete {
            return Ok(AdmissionReview::default());
        }

        let mut review = AdmissionReview {
            mutated: workloads::apply_defaults(workload),
            warnings: Vec::new(),
        };
        if operation == AdmissionOperation::Create && workload.status != WorkloadStatus::default()
        {
            workload.status = WorkloadStatus::default();
            review.mutated = true;
        }

        workloads::validate(&workload.spec)?;

        match self
            .probe
            .probe(&workload.spec.engine_endpoint, self.probe_timeout)
            .await
        {
            ProbeOutcome::Reachable => {
                debug!(endpoint = %workload.spec.engine_endpoint, "Engine endpoint reachable");
            }
            ProbeOutcome::Unreachable(reason) => {
                warn!(
                    endpoint = %workload.spec.engine_endpoint,
                    reason = %reason,
                    "Engine endpoint unreachable; admitting anyway"
                );
                review.warnings.push(format!(
                    "spec.engineEndpoint {} is not reachable: {}",
                    workload.spec.engine_endpoint, reason
                ));
            }
        }
        Ok(review)
    }

    pub fn admit_proposal(
        &self,
        operation: AdmissionOperation,
        proposal: &mut AgenticProposal,
        now: DateTime<Utc>,
    ) -> Result<AdmissionReview, ValidationError> {
        if operation == AdmissionOperation::Delete {
            return Ok(AdmissionReview::default());
        }
        let mutated = proposals::apply_defaults(proposal, now);
        proposals::validate(&proposal.spec)?;
        Ok(AdmissionReview {
            mutated,
            warnings: Vec::new(),
        })
    }
}
