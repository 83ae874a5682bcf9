//! Proposal consensus engine
//!
//! Voters carry weights, votes carry a decision and a 0..100 score, and the
//! engine reduces them to a single weighted score that is compared with the
//! proposal's threshold.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  votes ──► ConsensusTally::compute(votes, roster)          │
//! │               │  score = Σ w·c / Σ w  (voters who voted)   │
//! │               ▼                                            │
//! │          ConsensusThreshold::is_met(score)                 │
//! │               │                                            │
//! │               ▼                                            │
//! │  ProposalPhase::transition(ThresholdMet | ThresholdMissed) │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod consensus;
pub mod phase;
pub mod rule;
pub mod vote;

pub use consensus::{ConsensusOutcome, ConsensusTally, consensus_score};
pub use phase::{PhaseError, PhaseEvent, ProposalPhase};
pub use rule::ConsensusThreshold;
pub use vote::{
    CONDITIONAL_APPROVE_FACTOR, DEFAULT_VOTER_WEIGHT, MAX_VOTER_WEIGHT, MIN_VOTER_WEIGHT, Vote,
    VoteDecision, Voter,
};
