//! Application layer for agentic-conductor
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{BackoffPolicy, ControllerParams};
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    clock::{Clock, FixedClock, SystemClock},
    cluster::{ClusterError, ResourceStore, WorkflowEngine},
    endpoint_probe::{EndpointProbe, NoEndpointProbe, ProbeOutcome},
    license_source::{LicenseSource, StaticLicense},
    plan_executor::{DelegatingPlanExecutor, PlanExecutor},
};
pub use use_cases::admission::{AdmissionOperation, AdmissionReview, AdmissionUseCase};
pub use use_cases::cast_vote::{CastVoteError, CastVoteInput, CastVoteUseCase, VoteReceipt};
pub use use_cases::controller::{Controller, WorkQueue};
pub use use_cases::policy_gate::{GateOutcome, GatedAction, PolicyGate};
pub use use_cases::reconcile_proposal::ReconcileProposalUseCase;
pub use use_cases::reconcile_workload::ReconcileWorkloadUseCase;
pub use use_cases::shared::{Cancelled, ReconcileError, RequeuePolicy};
pub use use_cases::workflow_lifecycle::{CreateOutcome, LifecycleError, WorkflowLifecycleManager};
