//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod admission;
pub mod cast_vote;
pub mod controller;
pub mod policy_gate;
pub mod reconcile_proposal;
pub mod reconcile_workload;
pub mod shared;
pub mod workflow_lifecycle;
