//! Consensus threshold
//!
//! A proposal is approved when its weighted score reaches
//! `threshold × 100`. The threshold itself must lie in `[0.5, 1.0]`.

use crate::core::error::FieldError;
use serde::{Deserialize, Serialize};

pub const MIN_THRESHOLD: f64 = 0.5;
pub const MAX_THRESHOLD: f64 = 1.0;

/// Absorbs float noise in `threshold × 100` (e.g. `0.7 × 100`).
const SCORE_EPSILON: f64 = 1e-9;

/// Fraction of the maximum score required for approval.
///
/// # Example
///
/// ```
/// use conductor_domain::quorum::ConsensusThreshold;
///
/// let threshold = ConsensusThreshold::new(0.7).unwrap();
/// assert!(threshold.is_met(70.0));
/// assert!(!threshold.is_met(52.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsensusThreshold(f64);

impl ConsensusThreshold {
    pub fn new(value: f64) -> Result<Self, FieldError> {
        let threshold = Self(value);
        threshold.validate()?;
        Ok(threshold)
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if !self.0.is_finite() || !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.0) {
            return Err(FieldError::new(
                "spec.consensusThreshold",
                format!(
                    "must be within [{}, {}], got {}",
                    MIN_THRESHOLD, MAX_THRESHOLD, self.0
                ),
            ));
        }
        Ok(())
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Minimum score on the 0..100 scale.
    pub fn required_score(&self) -> f64 {
        self.0 * 100.0
    }

    pub fn is_met(&self, score: f64) -> bool {
        score + SCORE_EPSILON >= self.required_score()
    }

    pub fn description(&self) -> String {
        format!("score >= {:.1}", self.required_score())
    }
}

impl Default for ConsensusThreshold {
    fn default() -> Self {
        Self(0.7)
    }
}

impl std::fmt::Display for ConsensusThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
