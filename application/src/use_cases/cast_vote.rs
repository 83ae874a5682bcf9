//! Cast Vote use case
//!
//! Records one agent's vote on a proposal. The write goes through the
//! cluster's optimistic concurrency and is retried on conflict, re-reading
//! the proposal each time.

use super::shared::{Cancelled, cancellable, check_cancelled};
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger, VOTE_CAST};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::cluster::{ClusterError, ResourceStore};
use conductor_domain::{
    AgenticProposal, ConsensusError, ErrorKind, ProposalPhase, Vote, VoteOutcome,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Attempts made before giving up on a contended proposal.
pub const MAX_VOTE_ATTEMPTS: u32 = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastVoteError {
    #[error(transparent)]
    Rejected(#[from] ConsensusError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("Proposal kept changing; gave up after {attempts} attempts")]
    Contended { attempts: u32 },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl CastVoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CastVoteError::Rejected(e) => e.kind(),
            CastVoteError::Cluster(e) => e.kind(),
            CastVoteError::Contended { .. } => ErrorKind::ConflictRetry,
            CastVoteError::Cancelled(_) => ErrorKind::Transient,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastVoteInput {
    pub namespace: String,
    pub proposal: String,
    pub vote: Vote,
}

impl CastVoteInput {
    pub fn new(namespace: impl Into<String>, proposal: impl Into<String>, vote: Vote) -> Self {
        Self {
            namespace: namespace.into(),
            proposal: proposal.into(),
            vote,
        }
    }
}

/// What the proposal looked like once the vote was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteReceipt {
    pub outcome: VoteOutcome,
    pub phase: ProposalPhase,
    pub consensus_score: Option<f64>,
    pub consensus_reached: bool,
    pub attempts: u32,
}

pub struct CastVoteUseCase<S: ResourceStore + 'static> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
    max_attempts: u32,
}

impl<S: ResourceStore + 'static> CastVoteUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoAuditLogger),
            max_attempts: MAX_VOTE_ATTEMPTS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub async fn execute(
        &self,
        input: CastVoteInput,
        cancel: &CancellationToken,
    ) -> Result<VoteReceipt, CastVoteError> {
        for attempt in 1..=self.max_attempts {
            check_cancelled::<CastVoteError>(cancel)?;

            let mut proposal = cancellable(cancel, async {
                self.store
                    .get_proposal(&input.namespace, &input.proposal)
                    .await
                    .map_err(CastVoteError::from)
            })
            .await?;

            let outcome = proposal.cast_vote(input.vote.clone(), self.clock.now())?;
            let receipt = |proposal: &AgenticProposal| VoteReceipt {
                outcome,
                phase: proposal.status.phase,
                consensus_score: proposal.status.consensus_score,
                consensus_reached: proposal.status.consensus_reached,
                attempts: attempt,
            };

            if outcome == VoteOutcome::Duplicate {
                debug!(agent = %input.vote.agent, "Identical vote already recorded");
                return Ok(receipt(&proposal));
            }

            let written = cancellable(cancel, async {
                self.store
                    .update_proposal_status(&proposal)
                    .await
                    .map_err(CastVoteError::from)
            })
            .await;

            match written {
                Ok(stored) => {
                    info!(
                        proposal = %stored.name(),
                        agent = %input.vote.agent,
                        decision = %input.vote.decision,
                        score = input.vote.score,
                        "Vote recorded"
                    );
                    self.audit.log(AuditEvent::new(
                        VOTE_CAST,
                        json!({
                            "proposal": stored.key().to_string(),
                            "agent": input.vote.agent,
                            "decision": input.vote.decision.as_str(),
                            "score": input.vote.score,
                            "consensusScore": stored.status.consensus_score,
                            "attempt": attempt,
                        }),
                    ));
                    return Ok(receipt(&stored));
                }
                Err(CastVoteError::Cluster(e)) if e.is_conflict() => {
                    debug!(attempt, "Proposal changed underneath the vote; retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CastVoteError::Contended {
            attempts: self.max_attempts,
        })
    }
}
