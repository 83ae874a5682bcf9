//! JSON output formatter
//!
//! Every result is a single pretty-printed JSON document so the output can
//! be piped into `jq`.

use crate::output::formatter::{ConfigReport, OutputFormatter};
use conductor_application::{AdmissionReview, VoteReceipt};
use conductor_domain::{
    ConfigIssue, PolicyDecision, Severity, ValidationError, VerifiedLicense, VoteOutcome,
};
use serde_json::{Value, json};

pub struct JsonFormatter;

impl JsonFormatter {
    fn render(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn issue(issue: &ConfigIssue) -> Value {
        json!({
            "severity": match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            "key": issue.key,
            "message": issue.message,
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn policy_decision(&self, decision: &PolicyDecision) -> String {
        Self::render(&json!(decision))
    }

    fn admission_accepted(
        &self,
        kind: &str,
        name: &str,
        review: &AdmissionReview,
        object: &Value,
    ) -> String {
        Self::render(&json!({
            "kind": kind,
            "name": name,
            "allowed": true,
            "mutated": review.mutated,
            "warnings": review.warnings,
            "object": object,
        }))
    }

    fn admission_rejected(&self, kind: &str, name: &str, error: &ValidationError) -> String {
        let errors: Vec<Value> = error
            .errors
            .iter()
            .map(|e| json!({"field": e.field, "message": e.message}))
            .collect();
        Self::render(&json!({
            "kind": kind,
            "name": name,
            "allowed": false,
            "errors": errors,
        }))
    }

    fn vote_receipt(&self, proposal: &str, agent: &str, receipt: &VoteReceipt) -> String {
        Self::render(&json!({
            "proposal": proposal,
            "agent": agent,
            "outcome": match receipt.outcome {
                VoteOutcome::Recorded => "recorded",
                VoteOutcome::Duplicate => "duplicate",
            },
            "phase": receipt.phase.as_str(),
            "consensusScore": receipt.consensus_score,
            "consensusReached": receipt.consensus_reached,
            "attempts": receipt.attempts,
        }))
    }

    fn license(&self, license: &VerifiedLicense, seats_in_use: u32) -> String {
        Self::render(&json!({
            "valid": true,
            "claims": license.claims,
            "expiresAt": license.claims.expires_at_utc().to_rfc3339(),
            "seatsInUse": seats_in_use,
            "warning": license.warning.as_ref().map(|w| w.to_string()),
        }))
    }

    fn config_issues(&self, issues: &[ConfigIssue]) -> String {
        let issues: Vec<Value> = issues.iter().map(Self::issue).collect();
        Self::render(&Value::Array(issues))
    }

    fn config_report(&self, report: &ConfigReport) -> String {
        let sources: Vec<Value> = report
            .sources
            .iter()
            .map(|s| json!({"name": s.name, "location": s.location, "found": s.found}))
            .collect();
        let issues: Vec<Value> = report.issues.iter().map(Self::issue).collect();
        Self::render(&json!({
            "sources": sources,
            "effective": report.effective,
            "issues": issues,
        }))
    }
}
