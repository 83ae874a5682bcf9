//! Vote types for proposal consensus
//!
//! A [`Vote`] is cast by one agent on the proposal's roster of [`Voter`]s.
//! Its directional contribution to the consensus score depends on the
//! decision: full score for APPROVE, 75% for CONDITIONAL_APPROVE, nothing
//! for REJECT.

use crate::core::error::FieldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Weight applied to a CONDITIONAL_APPROVE score.
pub const CONDITIONAL_APPROVE_FACTOR: f64 = 0.75;

pub const MIN_VOTER_WEIGHT: f64 = 0.1;
pub const MAX_VOTER_WEIGHT: f64 = 5.0;
pub const DEFAULT_VOTER_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteDecision {
    Approve,
    ConditionalApprove,
    Reject,
}

impl VoteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDecision::Approve => "APPROVE",
            VoteDecision::ConditionalApprove => "CONDITIONAL_APPROVE",
            VoteDecision::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for VoteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoteDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "APPROVE" => Ok(VoteDecision::Approve),
            "CONDITIONAL_APPROVE" | "CONDITIONAL" => Ok(VoteDecision::ConditionalApprove),
            "REJECT" => Ok(VoteDecision::Reject),
            _ => Err(format!(
                "Unknown vote decision: {}. Valid: approve, conditional_approve, reject",
                s
            )),
        }
    }
}

/// An agent entitled to vote, with its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub agent: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    DEFAULT_VOTER_WEIGHT
}

impl Voter {
    pub fn new(agent: impl Into<String>, weight: f64) -> Self {
        Self {
            agent: agent.into(),
            weight,
        }
    }
}

/// A single vote from an agent
///
/// # Example
///
/// ```
/// use conductor_domain::quorum::{Vote, VoteDecision};
///
/// let vote = Vote::conditional("reviewer-a", 80).with_feedback("add a rollback step");
/// assert_eq!(vote.decision, VoteDecision::ConditionalApprove);
/// assert_eq!(vote.contribution(), 60.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub agent: String,
    pub decision: VoteDecision,
    /// 0..=100
    pub score: u8,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    pub fn new(agent: impl Into<String>, decision: VoteDecision, score: u8) -> Self {
        Self {
            agent: agent.into(),
            decision,
            score,
            feedback: String::new(),
            timestamp: DateTime::<Utc>::default(),
        }
    }

    pub fn approve(agent: impl Into<String>, score: u8) -> Self {
        Self::new(agent, VoteDecision::Approve, score)
    }

    pub fn conditional(agent: impl Into<String>, score: u8) -> Self {
        Self::new(agent, VoteDecision::ConditionalApprove, score)
    }

    pub fn reject(agent: impl Into<String>, score: u8) -> Self {
        Self::new(agent, VoteDecision::Reject, score)
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Directional contribution before weighting.
    pub fn contribution(&self) -> f64 {
        let score = f64::from(self.score);
        match self.decision {
            VoteDecision::Approve => score,
            VoteDecision::ConditionalApprove => score * CONDITIONAL_APPROVE_FACTOR,
            VoteDecision::Reject => 0.0,
        }
    }

    /// Same ballot, ignoring when it was cast.
    pub fn same_content(&self, other: &Vote) -> bool {
        self.agent == other.agent
            && self.decision == other.decision
            && self.score == other.score
            && self.feedback == other.feedback
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.score > 100 {
            return Err(FieldError::new(
                "vote.score",
                format!("must be within [0, 100], got {}", self.score),
            ));
        }
        if self.agent.trim().is_empty() {
            return Err(FieldError::new("vote.agent", "must not be empty"));
        }
        Ok(())
    }
}
