//! State changes on a proposal: vote ingestion, consensus calculation and
//! execution bookkeeping.
//!
//! Every mutation goes through the phase machine in
//! [`crate::quorum::phase`], so a terminal proposal can only have its
//! conditions touched.

use super::entities::{AgenticProposal, ExecutionResult};
use crate::core::error::{ErrorKind, FieldError};
use crate::quorum::{ConsensusTally, PhaseError, PhaseEvent, ProposalPhase, Vote};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// What [`AgenticProposal::cast_vote`] did with a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Appended to the vote list.
    Recorded,
    /// Identical to a vote already on record; nothing changed.
    Duplicate,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsensusError {
    #[error("invalid vote: {0}")]
    InvalidVote(FieldError),

    #[error("agent {agent} is not on the voter roster")]
    UnknownVoter { agent: String },

    #[error("agent {agent} already voted with different content")]
    ConflictingVote { agent: String },

    #[error("voting is closed (phase {phase})")]
    VotingClosed { phase: ProposalPhase },

    #[error(transparent)]
    Phase(#[from] PhaseError),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailed
    }
}

impl AgenticProposal {
    pub fn tally(&self) -> ConsensusTally {
        ConsensusTally::compute(&self.status.votes, &self.spec.voters)
    }

    /// Record `vote`, idempotently on the voting agent.
    ///
    /// A retry with the same content is a no-op. A second vote with different
    /// content is refused, never overwritten.
    pub fn cast_vote(
        &mut self,
        mut vote: Vote,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, ConsensusError> {
        vote.validate().map_err(ConsensusError::InvalidVote)?;

        if let Some(existing) = self.status.votes.iter().find(|v| v.agent == vote.agent) {
            if existing.same_content(&vote) {
                return Ok(VoteOutcome::Duplicate);
            }
            return Err(ConsensusError::ConflictingVote { agent: vote.agent });
        }

        let phase = self.status.phase;
        if phase.is_terminal() {
            return Err(PhaseError::Terminal {
                phase,
                event: PhaseEvent::VoteReceived,
            }
            .into());
        }
        if !phase.accepts_votes() || self.deadline_passed(now) {
            return Err(ConsensusError::VotingClosed { phase });
        }
        if self.spec.voter(&vote.agent).is_none() {
            return Err(ConsensusError::UnknownVoter { agent: vote.agent });
        }

        if vote.timestamp == DateTime::<Utc>::default() {
            vote.timestamp = now;
        }
        self.status.phase = phase.transition(PhaseEvent::VoteReceived)?;
        self.status.votes.push(vote);
        self.recompute();
        Ok(VoteOutcome::Recorded)
    }

    /// Refresh the derived score fields from votes and roster.
    pub fn recompute(&mut self) -> ConsensusTally {
        let tally = self.tally();
        self.status.consensus_score = tally.score;
        self.status.consensus_reached = tally.reached(self.spec.consensus_threshold);
        self.status.discarded_voters = tally.discarded.clone();
        tally
    }

    /// Every roster member has a vote on record.
    pub fn all_voted(&self) -> bool {
        self.spec
            .voters
            .iter()
            .all(|voter| self.status.votes.iter().any(|v| v.agent == voter.agent))
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.spec.voting_deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn voting_closed(&self, now: DateTime<Utc>) -> bool {
        self.all_voted() || self.deadline_passed(now)
    }

    /// Move the proposal as far through review and calculation as its votes
    /// allow. Returns the events applied, in order.
    ///
    /// A proposal with no votes stays `Pending` even past its deadline. One
    /// that reaches `Calculating` without a defined score (every vote came
    /// from a removed voter) is rejected.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Vec<PhaseEvent>, ConsensusError> {
        let mut applied = Vec::new();
        if self.status.phase.is_terminal() {
            return Ok(applied);
        }
        let tally = self.recompute();

        loop {
            let event = match self.status.phase {
                ProposalPhase::Pending if !self.status.votes.is_empty() => {
                    PhaseEvent::VoteReceived
                }
                ProposalPhase::InReview if self.voting_closed(now) => PhaseEvent::VotingClosed,
                ProposalPhase::Calculating if tally.reached(self.spec.consensus_threshold) => {
                    PhaseEvent::ThresholdMet
                }
                ProposalPhase::Calculating => PhaseEvent::ThresholdMissed,
                _ => break,
            };
            self.status.phase = self.status.phase.transition(event)?;
            if event == PhaseEvent::VotingClosed {
                self.status.calculated_at = Some(now);
            }
            applied.push(event);
        }
        Ok(applied)
    }

    pub fn start_execution(&mut self, now: DateTime<Utc>) -> Result<(), ConsensusError> {
        self.status.phase = self
            .status
            .phase
            .transition(PhaseEvent::ExecutionStarted)?;
        self.status.execution_started_at = Some(now);
        Ok(())
    }

    pub fn finish_execution(
        &mut self,
        result: ExecutionResult,
        now: DateTime<Utc>,
    ) -> Result<(), ConsensusError> {
        let event = if result.success {
            PhaseEvent::ExecutionSucceeded
        } else {
            PhaseEvent::ExecutionFailed
        };
        self.status.phase = self.status.phase.transition(event)?;
        self.status.completed_at = Some(now);
        self.status.execution_result = Some(result);
        Ok(())
    }
}
