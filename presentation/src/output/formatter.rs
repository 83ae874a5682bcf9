//! Output formatter trait

use conductor_application::{AdmissionReview, VoteReceipt};
use conductor_domain::{ConfigIssue, PolicyDecision, ValidationError, VerifiedLicense};

/// One configuration source as shown by `show-config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    /// File path or environment prefix; `None` for built-in defaults.
    pub location: Option<String>,
    pub found: bool,
}

/// Everything `show-config` reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReport {
    /// Highest priority first.
    pub sources: Vec<SourceEntry>,
    /// The effective configuration, one JSON object per section.
    pub effective: serde_json::Value,
    pub issues: Vec<ConfigIssue>,
}

/// Trait for rendering operator command results
pub trait OutputFormatter {
    /// Result of a policy dry run
    fn policy_decision(&self, decision: &PolicyDecision) -> String;

    /// An admitted object, with the defaulted object itself
    fn admission_accepted(
        &self,
        kind: &str,
        name: &str,
        review: &AdmissionReview,
        object: &serde_json::Value,
    ) -> String;

    /// An object admission refused
    fn admission_rejected(&self, kind: &str, name: &str, error: &ValidationError) -> String;

    /// Proposal state after a vote
    fn vote_receipt(&self, proposal: &str, agent: &str, receipt: &VoteReceipt) -> String;

    /// Claims of a verified licence
    fn license(&self, license: &VerifiedLicense, seats_in_use: u32) -> String;

    /// Issues found while validating configuration
    fn config_issues(&self, issues: &[ConfigIssue]) -> String;

    /// Sources, effective values and issues of the loaded configuration
    fn config_report(&self, report: &ConfigReport) -> String;
}
