//! Agentic proposals: deliberation records that gate a suspended workflow
//! on weighted consensus.

pub mod aggregate;
pub mod entities;
pub mod validation;

pub use aggregate::{ConsensusError, VoteOutcome};
pub use entities::{
    AgenticProposal, ExecutionPlan, ExecutionResult, PROPOSAL_KIND, PlanType, PlannedAction,
    ProposalSpec, ProposalStatus, ProposedBy,
};
pub use validation::{apply_defaults, validate};
