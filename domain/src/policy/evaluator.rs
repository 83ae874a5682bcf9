//! Action admission rule cascade.
//!
//! [`evaluate`] is pure: the same input and mode always produce the same
//! decision. The base cascade runs first (first matching rule wins), then
//! the mode overlay may tighten (strict) or relax (permissive) the result.
//!
//! ```text
//! 1. READONLY                                   → allow
//! 2. confidence < 0.90 ∧ health < 40            → deny  (CRITICAL)
//! 3. confidence ≥ 0.95 ∧ ¬DESTRUCTIVE ∧ h ≥ 50  → allow
//! 4. DESTRUCTIVE ∧ confidence < 0.99            → deny
//! 5. health < 50                                → deny
//! 6. confidence < 0.95                          → deny
//! 7. confidence ≥ 0.80 ∧ health ≥ 50            → allow
//! 8. otherwise                                  → deny
//! ```
//!
//! Rule 1 must stay ahead of rule 2: read-only actions are admitted even
//! when the cluster is critical.

use super::bands::{ClusterStatus, ConfidenceBand};
use super::category::ActionCategory;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Overlay applied after the base cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Base cascade only.
    Base,
    /// Anything below HIGH confidence that is not read-only is denied.
    #[default]
    Strict,
    /// MEDIUM confidence on a non-critical cluster is admitted.
    Permissive,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::Base => "base",
            PolicyMode::Strict => "strict",
            PolicyMode::Permissive => "permissive",
        }
    }
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(PolicyMode::Base),
            "strict" => Ok(PolicyMode::Strict),
            "permissive" => Ok(PolicyMode::Permissive),
            _ => Err(format!(
                "Unknown policy mode: {}. Valid: base, strict, permissive",
                s
            )),
        }
    }
}

/// A proposed action as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub action_type: String,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
    /// In `[0, 100]`.
    pub cluster_health: u8,
}

impl PolicyInput {
    pub fn new(action_type: impl Into<String>, confidence: f64, cluster_health: u8) -> Self {
        Self {
            action_type: action_type.into(),
            confidence: confidence.clamp(0.0, 1.0),
            cluster_health: cluster_health.min(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub action_type: String,
    pub allowed: bool,
    pub category: ActionCategory,
    pub band: ConfidenceBand,
    pub cluster_status: ClusterStatus,
    pub mode: PolicyMode,
    /// Human-readable justification, one entry per rule that fired.
    pub reasons: Vec<String>,
}

/// Evaluate `input` under `mode`.
pub fn evaluate(input: &PolicyInput, mode: PolicyMode) -> PolicyDecision {
    let category = ActionCategory::classify(&input.action_type);
    let band = ConfidenceBand::assess(input.confidence);
    let cluster_status = ClusterStatus::assess(input.cluster_health);

    let (mut allowed, reason) = base_cascade(input, category);
    let mut reasons = vec![reason];

    match mode {
        PolicyMode::Base => {}
        PolicyMode::Strict => {
            if band != ConfidenceBand::High && category != ActionCategory::ReadOnly {
                allowed = false;
                reasons.push(format!(
                    "Strict mode: {} confidence ({:.2}) is below HIGH for a {} action",
                    band, input.confidence, category
                ));
            }
        }
        PolicyMode::Permissive => {
            // Destructive actions keep the 0.99 floor in every mode.
            if band == ConfidenceBand::Medium
                && input.cluster_health >= 50
                && category != ActionCategory::Destructive
            {
                allowed = true;
                reasons = vec![format!(
                    "Permissive mode: MEDIUM confidence ({:.2}) accepted with cluster health {}",
                    input.confidence, input.cluster_health
                )];
            }
        }
    }

    PolicyDecision {
        action_type: input.action_type.clone(),
        allowed,
        category,
        band,
        cluster_status,
        mode,
        reasons,
    }
}

fn base_cascade(input: &PolicyInput, category: ActionCategory) -> (bool, String) {
    let confidence = input.confidence;
    let health = input.cluster_health;
    let destructive = category == ActionCategory::Destructive;

    if category == ActionCategory::ReadOnly {
        return (
            true,
            format!("Read-only action '{}' is always permitted", input.action_type),
        );
    }
    if confidence < 0.90 && health < 40 {
        return (
            false,
            format!(
                "CRITICAL: cluster health {} is below 40 and confidence {:.2} is below 0.90",
                health, confidence
            ),
        );
    }
    if confidence >= 0.95 && !destructive && health >= 50 {
        return (
            true,
            format!(
                "High confidence ({:.2}) non-destructive action on a cluster with health {}",
                confidence, health
            ),
        );
    }
    if destructive && confidence < 0.99 {
        return (
            false,
            format!(
                "Destructive action '{}' requires confidence >= 0.99, got {:.2}",
                input.action_type, confidence
            ),
        );
    }
    if health < 50 {
        return (
            false,
            format!(
                "Cluster health {} is below 50; only read-only actions are permitted",
                health
            ),
        );
    }
    if confidence < 0.95 {
        return (
            false,
            format!("Confidence {:.2} is below the required 0.95", confidence),
        );
    }
    if confidence >= 0.80 && health >= 50 {
        return (
            true,
            format!(
                "Confidence {:.2} and cluster health {} are within bounds",
                confidence, health
            ),
        );
    }
    (false, "No policy rule admitted the action".to_string())
}
