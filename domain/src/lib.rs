//! Domain layer for agentic-conductor
//!
//! This crate contains the decision logic of the control plane as pure
//! types and functions. It performs no I/O and does not log; clocks are
//! passed in as `DateTime<Utc>` values.
//!
//! # Core Concepts
//!
//! ## Policy
//!
//! Every proposed action is classified (destructive / read-only /
//! modification), banded by confidence and cluster health, and admitted or
//! denied by a fixed rule cascade with a strict or permissive overlay.
//!
//! ## Licence
//!
//! Signed `header.claims.signature` tokens are verified against an
//! embedded Ed25519 key and checked for expiry and seat count.
//!
//! ## Consensus
//!
//! Proposals collect weighted votes; the weighted score decides approval
//! and drives the proposal through its lifecycle state machine.
//!
//! ## Workflow
//!
//! An admitted workload is materialised as a workflow object on the
//! external engine, owned by the workload so deletion cascades.

pub mod config;
pub mod core;
pub mod license;
pub mod policy;
pub mod proposal;
pub mod quorum;
pub mod workflow;
pub mod workload;

// Re-export commonly used types
pub use config::{ConfigIssue, OutputFormat, Severity};
pub use core::{
    condition::{
        CONDITION_ACTIONS_DENIED, CONDITION_AWAITING_APPROVAL, CONDITION_CONSENSUS,
        CONDITION_DEGRADED, CONDITION_READY, Condition, ConditionStatus, Conditions,
    },
    confidence::{Confidence, round2},
    error::{ErrorKind, FieldError, ValidationError},
    meta::{API_GROUP, API_VERSION, ObjectMeta, OwnerReference, ResourceKey, ResourceKind},
};
pub use license::{LicenseClaims, LicenseError, LicenseVerifier, Tier, VerifiedLicense};
pub use policy::{
    ActionCategory, ClusterStatus, ConfidenceBand, PolicyDecision, PolicyInput, PolicyMode,
    evaluate,
};
pub use proposal::{
    AgenticProposal, ConsensusError, ExecutionPlan, ExecutionResult, PlanType, PlannedAction,
    ProposalSpec, ProposalStatus, VoteOutcome,
};
pub use quorum::{
    ConsensusOutcome, ConsensusTally, ConsensusThreshold, PhaseEvent, ProposalPhase, Vote,
    VoteDecision, Voter,
};
pub use workflow::{Workflow, WorkflowDefaults, WorkflowPhase, WorkflowState};
pub use workload::{Action, AgentWorkload, Approval, WorkloadPhase, WorkloadSpec, WorkloadStatus};
