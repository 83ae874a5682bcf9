//! Agentic workloads: the declared unit of work a workflow is created for.

pub mod action;
pub mod entities;
pub mod validation;

pub use action::{Action, Approval};
pub use entities::{
    AgentWorkload, AppliedProposal, WORKLOAD_KIND, WorkloadPhase, WorkloadSpec, WorkloadStatus,
    WorkloadType,
};
pub use validation::{
    DEFAULT_AUTO_APPROVE_THRESHOLD, DEFAULT_AUTO_APPROVE_THRESHOLD_TEXT, DEFAULT_POLICY_MODE,
    MAX_OBJECTIVE_LEN, apply_defaults, is_valid_agent_id, validate, validate_endpoint,
};
