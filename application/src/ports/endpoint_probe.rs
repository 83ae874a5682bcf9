//! Endpoint reachability probe port.
//!
//! Admission probes the workload's engine endpoint. The probe is best
//! effort: an unreachable endpoint produces a warning, never a rejection.

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    /// Non-200 status, timeout, DNS or connection failure.
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// Skips probing; every endpoint counts as reachable.
pub struct NoEndpointProbe;

#[async_trait]
impl EndpointProbe for NoEndpointProbe {
    async fn probe(&self, _url: &str, _timeout: Duration) -> ProbeOutcome {
        ProbeOutcome::Reachable
    }
}
