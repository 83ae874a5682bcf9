//! Port for the decision audit trail.
//!
//! Defines the [`AuditLogger`] trait for recording control-plane decisions
//! (licence checks, workflow creation, policy verdicts, votes, consensus,
//! resumes) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures each decision in a
//! machine-readable format (JSONL) for later review.

use serde_json::Value;

pub const LICENSE_CHECKED: &str = "license_checked";
pub const WORKFLOW_CREATED: &str = "workflow_created";
pub const POLICY_DECISION: &str = "policy_decision";
pub const VOTE_CAST: &str = "vote_cast";
pub const CONSENSUS_REACHED: &str = "consensus_reached";
pub const WORKFLOW_RESUMED: &str = "workflow_resumed";

/// A structured audit event.
///
/// The adapter stamps the time; the payload carries event-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Event type identifier, one of the constants in this module.
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging audit events.
///
/// `log` is synchronous and infallible so that auditing never fails a
/// reconcile; adapters swallow their own I/O errors.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
