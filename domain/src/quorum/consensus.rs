//! Weighted consensus scoring
//!
//! `S = Σ(wᵢ · cᵢ) / Σ(wᵢ)` over the roster members that have voted, where
//! `cᵢ` is the vote's [`contribution`](super::vote::Vote::contribution).
//! Votes from agents that are no longer on the roster are reported as
//! discarded and do not count.

use super::rule::ConsensusThreshold;
use super::vote::{Vote, Voter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of evaluating a tally against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusOutcome {
    /// Score reached the threshold
    Approved,
    /// Score fell short of the threshold
    Rejected,
    /// No counted votes yet, so the score is undefined
    Pending,
}

impl ConsensusOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, ConsensusOutcome::Approved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ConsensusOutcome::Rejected)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ConsensusOutcome::Pending)
    }
}

impl std::fmt::Display for ConsensusOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusOutcome::Approved => write!(f, "Approved"),
            ConsensusOutcome::Rejected => write!(f, "Rejected"),
            ConsensusOutcome::Pending => write!(f, "Pending"),
        }
    }
}

/// Result of scoring a vote list against a roster
///
/// # Example
///
/// ```
/// use conductor_domain::quorum::{ConsensusTally, ConsensusThreshold, Vote, Voter};
///
/// let voters = vec![Voter::new("a", 1.0), Voter::new("b", 2.0), Voter::new("c", 1.0)];
/// let votes = vec![
///     Vote::approve("a", 90),
///     Vote::conditional("b", 80),
///     Vote::reject("c", 0),
/// ];
///
/// let tally = ConsensusTally::compute(&votes, &voters);
/// assert_eq!(tally.score, Some(52.5));
/// assert!(tally.outcome(ConsensusThreshold::new(0.7).unwrap()).is_rejected());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusTally {
    /// Weighted score in `[0, 100]`, `None` until a roster member votes
    pub score: Option<f64>,
    /// Votes that contributed to the score
    pub counted: usize,
    /// Sum of the weights of the counted voters
    pub total_weight: f64,
    /// Agents whose votes were ignored because they left the roster
    pub discarded: Vec<String>,
}

impl ConsensusTally {
    /// Score `votes` against `voters`.
    ///
    /// The roster is walked in its declared order so the floating-point
    /// sum does not depend on the order votes arrived in.
    pub fn compute(votes: &[Vote], voters: &[Voter]) -> Self {
        let mut seen = BTreeSet::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut counted = 0;

        for voter in voters {
            if !seen.insert(voter.agent.as_str()) {
                continue;
            }
            if let Some(vote) = votes.iter().find(|v| v.agent == voter.agent) {
                weighted += voter.weight * vote.contribution();
                total_weight += voter.weight;
                counted += 1;
            }
        }

        let discarded: Vec<String> = votes
            .iter()
            .filter(|v| !seen.contains(v.agent.as_str()))
            .map(|v| v.agent.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let score = (counted > 0 && total_weight > 0.0).then(|| weighted / total_weight);

        Self {
            score,
            counted,
            total_weight,
            discarded,
        }
    }

    pub fn reached(&self, threshold: ConsensusThreshold) -> bool {
        self.score.is_some_and(|s| threshold.is_met(s))
    }

    pub fn outcome(&self, threshold: ConsensusThreshold) -> ConsensusOutcome {
        match self.score {
            None => ConsensusOutcome::Pending,
            Some(s) if threshold.is_met(s) => ConsensusOutcome::Approved,
            Some(_) => ConsensusOutcome::Rejected,
        }
    }
}

/// Shorthand for [`ConsensusTally::compute`] when only the score matters.
pub fn consensus_score(votes: &[Vote], voters: &[Voter]) -> Option<f64> {
    ConsensusTally::compute(votes, voters).score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quorum::vote::VoteDecision;
    use proptest::prelude::*;

    fn roster() -> Vec<Voter> {
        vec![
            Voter::new("a", 1.0),
            Voter::new("b", 2.0),
            Voter::new("c", 1.0),
        ]
    }

    #[test]
    fn test_weighted_score_example() {
        let votes = vec![
            Vote::approve("a", 90),
            Vote::conditional("b", 80),
            Vote::reject("c", 0),
        ];
        let tally = ConsensusTally::compute(&votes, &roster());
        assert_eq!(tally.score, Some(52.5));
        assert_eq!(tally.counted, 3);
        assert_eq!(tally.total_weight, 4.0);

        let threshold = ConsensusThreshold::new(0.7).unwrap();
        assert!(!tally.reached(threshold));
        assert_eq!(tally.outcome(threshold), ConsensusOutcome::Rejected);
    }

    #[test]
    fn test_no_votes_is_undefined() {
        let tally = ConsensusTally::compute(&[], &roster());
        assert_eq!(tally.score, None);
        assert!(tally.outcome(ConsensusThreshold::default()).is_pending());
    }

    #[test]
    fn test_score_is_over_voters_not_roster() {
        // Only "a" voted; absent voters do not drag the score down.
        let tally = ConsensusTally::compute(&[Vote::approve("a", 80)], &roster());
        assert_eq!(tally.score, Some(80.0));
        assert_eq!(tally.counted, 1);
    }

    #[test]
    fn test_removed_voter_is_discarded() {
        let votes = vec![Vote::approve("a", 100), Vote::reject("gone", 0)];
        let tally = ConsensusTally::compute(&votes, &roster());
        assert_eq!(tally.score, Some(100.0));
        assert_eq!(tally.discarded, vec!["gone".to_string()]);
    }

    #[test]
    fn test_only_discarded_votes_is_undefined() {
        let tally = ConsensusTally::compute(&[Vote::approve("gone", 100)], &roster());
        assert_eq!(tally.score, None);
        assert_eq!(tally.counted, 0);
    }

    #[test]
    fn test_conditional_dilutes_but_can_pass() {
        let voters = vec![Voter::new("a", 1.0)];
        let tally = ConsensusTally::compute(&[Vote::conditional("a", 100)], &voters);
        assert_eq!(tally.score, Some(75.0));
        assert!(tally.reached(ConsensusThreshold::new(0.75).unwrap()));
        assert!(!tally.reached(ConsensusThreshold::new(0.8).unwrap()));
    }

    fn arb_decision() -> impl Strategy<Value = VoteDecision> {
        prop_oneof![
            Just(VoteDecision::Approve),
            Just(VoteDecision::ConditionalApprove),
            Just(VoteDecision::Reject),
        ]
    }

    /// A roster of up to 8 distinct agents and a vote from a subset of them.
    fn arb_ballot() -> impl Strategy<Value = (Vec<Voter>, Vec<Vote>)> {
        prop::collection::vec((1u32..=50, any::<bool>(), arb_decision(), 0u8..=100), 1..8).prop_map(
            |entries| {
                let mut voters = Vec::new();
                let mut votes = Vec::new();
                for (i, (w, voted, decision, score)) in entries.into_iter().enumerate() {
                    let agent = format!("agent-{}", i);
                    voters.push(Voter::new(agent.clone(), f64::from(w) / 10.0));
                    if voted {
                        votes.push(Vote::new(agent, decision, score));
                    }
                }
                (voters, votes)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_score_is_permutation_invariant(
            (voters, votes) in arb_ballot(),
            seed in any::<u64>(),
        ) {
            let mut shuffled = votes.clone();
            // Deterministic Fisher-Yates driven by the seed.
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            prop_assert_eq!(
                consensus_score(&votes, &voters),
                consensus_score(&shuffled, &voters)
            );
        }

        #[test]
        fn prop_score_stays_in_range((voters, votes) in arb_ballot()) {
            if let Some(s) = consensus_score(&votes, &voters) {
                prop_assert!((0.0..=100.0 + 1e-9).contains(&s));
            }
        }

        #[test]
        fn prop_reject_never_increases_score(
            (mut voters, votes) in arb_ballot(),
            weight in 1u32..=50,
        ) {
            let before = consensus_score(&votes, &voters);
            voters.push(Voter::new("late", f64::from(weight) / 10.0));
            let mut with_reject = votes.clone();
            with_reject.push(Vote::reject("late", 0));
            let after = consensus_score(&with_reject, &voters).unwrap();
            if let Some(before) = before {
                prop_assert!(after <= before + 1e-9);
            } else {
                prop_assert_eq!(after, 0.0);
            }
        }

        #[test]
        fn prop_approve_at_or_above_score_never_decreases_it(
            (mut voters, votes) in arb_ballot(),
            weight in 1u32..=50,
        ) {
            let Some(before) = consensus_score(&votes, &voters) else {
                return Ok(());
            };
            // An APPROVE scored at least the current average only pulls it up.
            let score = before.ceil().min(100.0) as u8;
            voters.push(Voter::new("late", f64::from(weight) / 10.0));
            let mut with_approve = votes.clone();
            with_approve.push(Vote::approve("late", score));
            let after = consensus_score(&with_approve, &voters).unwrap();
            prop_assert!(after + 1e-9 >= before);
        }
    }
}
