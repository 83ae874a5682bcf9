//! Plan executor port.
//!
//! Runs the execution plan of an approved proposal. Failures are reported
//! through [`ExecutionResult::success`] rather than as errors; the proposal
//! records them and moves to `Failed`.

use async_trait::async_trait;
use conductor_domain::{AgenticProposal, ExecutionResult};

#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn execute(&self, proposal: &AgenticProposal) -> ExecutionResult;
}

/// Leaves the work to the gated workflow and reports success.
pub struct DelegatingPlanExecutor;

#[async_trait]
impl PlanExecutor for DelegatingPlanExecutor {
    async fn execute(&self, proposal: &AgenticProposal) -> ExecutionResult {
        ExecutionResult::succeeded(format!(
            "delegated {} plan to the workflow engine",
            proposal.spec.execution_plan.plan_type
        ))
    }
}
