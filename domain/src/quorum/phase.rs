//! Proposal lifecycle state machine
//!
//! ```text
//! Pending ──VoteReceived──► InReview ──VotingClosed──► Calculating
//! Calculating ──ThresholdMet──► Approved ──ExecutionStarted──► Executing
//! Calculating ──ThresholdMissed──► Rejected
//! Executing ──ExecutionSucceeded──► Completed
//! Executing ──ExecutionFailed──► Failed
//! ```
//!
//! Rejected, Completed and Failed are terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProposalPhase {
    #[default]
    Pending,
    InReview,
    Calculating,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
}

impl ProposalPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalPhase::Pending => "Pending",
            ProposalPhase::InReview => "InReview",
            ProposalPhase::Calculating => "Calculating",
            ProposalPhase::Approved => "Approved",
            ProposalPhase::Rejected => "Rejected",
            ProposalPhase::Executing => "Executing",
            ProposalPhase::Completed => "Completed",
            ProposalPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalPhase::Rejected | ProposalPhase::Completed | ProposalPhase::Failed
        )
    }

    /// Phases in which votes are still accepted.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, ProposalPhase::Pending | ProposalPhase::InReview)
    }

    /// Consensus was reached at some point (the plan may be running or done).
    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            ProposalPhase::Approved | ProposalPhase::Executing | ProposalPhase::Completed
        )
    }

    /// Apply `event`, or report why it is not allowed from this phase.
    pub fn transition(self, event: PhaseEvent) -> Result<ProposalPhase, PhaseError> {
        use PhaseEvent::*;
        use ProposalPhase::*;

        if self.is_terminal() {
            return Err(PhaseError::Terminal { phase: self, event });
        }
        let next = match (self, event) {
            (Pending, VoteReceived) => InReview,
            (InReview, VoteReceived) => InReview,
            (InReview, VotingClosed) => Calculating,
            (Calculating, ThresholdMet) => Approved,
            (Calculating, ThresholdMissed) => Rejected,
            (Approved, ExecutionStarted) => Executing,
            (Executing, ExecutionSucceeded) => Completed,
            (Executing, ExecutionFailed) => Failed,
            _ => return Err(PhaseError::InvalidTransition { from: self, event }),
        };
        Ok(next)
    }
}

impl std::fmt::Display for ProposalPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseEvent {
    VoteReceived,
    VotingClosed,
    ThresholdMet,
    ThresholdMissed,
    ExecutionStarted,
    ExecutionSucceeded,
    ExecutionFailed,
}

impl std::fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PhaseEvent::VoteReceived => "vote received",
            PhaseEvent::VotingClosed => "voting closed",
            PhaseEvent::ThresholdMet => "threshold met",
            PhaseEvent::ThresholdMissed => "threshold missed",
            PhaseEvent::ExecutionStarted => "execution started",
            PhaseEvent::ExecutionSucceeded => "execution succeeded",
            PhaseEvent::ExecutionFailed => "execution failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("proposal is {phase} (terminal); cannot apply {event}")]
    Terminal {
        phase: ProposalPhase,
        event: PhaseEvent,
    },

    #[error("cannot apply {event} in phase {from}")]
    InvalidTransition {
        from: ProposalPhase,
        event: PhaseEvent,
    },
}
