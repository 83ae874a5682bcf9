//! Confidence bands and cluster-health status.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    /// `≥ 0.95 → HIGH`, `≥ 0.80 → MEDIUM`, else `LOW`.
    pub fn assess(confidence: f64) -> Self {
        if confidence >= 0.95 {
            ConfidenceBand::High
        } else if confidence >= 0.80 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            ConfidenceBand::Low => 0,
            ConfidenceBand::Medium => 1,
            ConfidenceBand::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Low => "LOW",
            ConfidenceBand::Medium => "MEDIUM",
            ConfidenceBand::High => "HIGH",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterStatus {
    Healthy,
    Degraded,
    Critical,
}

impl ClusterStatus {
    /// `≥ 80 → HEALTHY`, `≥ 50 → DEGRADED`, else `CRITICAL`.
    pub fn assess(health: u8) -> Self {
        if health >= 80 {
            ClusterStatus::Healthy
        } else if health >= 50 {
            ClusterStatus::Degraded
        } else {
            ClusterStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Healthy => "HEALTHY",
            ClusterStatus::Degraded => "DEGRADED",
            ClusterStatus::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
