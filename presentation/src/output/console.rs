//! Console output formatter for operator commands

use crate::output::formatter::{ConfigReport, OutputFormatter};
use colored::Colorize;
use conductor_application::{AdmissionReview, VoteReceipt};
use conductor_domain::{
    ConfigIssue, PolicyDecision, Severity, ValidationError, VerifiedLicense, VoteOutcome,
};

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_policy_decision(decision: &PolicyDecision) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Policy Decision"));
        output.push('\n');

        let verdict = if decision.allowed {
            "ALLOWED".green().bold()
        } else {
            "DENIED".red().bold()
        };
        output.push_str(&format!(
            "{} {}  {}\n\n",
            "Action:".cyan().bold(),
            decision.action_type,
            verdict
        ));
        output.push_str(&Self::field("Category", decision.category.as_str()));
        output.push_str(&Self::field("Confidence", decision.band.as_str()));
        output.push_str(&Self::field("Cluster", decision.cluster_status.as_str()));
        output.push_str(&Self::field("Mode", decision.mode.as_str()));

        output.push_str(&Self::section_header("Reasons"));
        for reason in &decision.reasons {
            output.push_str(&format!("  * {}\n", reason));
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn format_admission_accepted(
        kind: &str,
        name: &str,
        review: &AdmissionReview,
        object: &serde_json::Value,
    ) -> String {
        let mut output = format!(
            "{} {} {} admitted\n",
            "✓".green().bold(),
            kind,
            name.bold()
        );
        if review.mutated {
            output.push_str(&format!("  {}\n", "defaults applied".dimmed()));
        }
        for warning in &review.warnings {
            output.push_str(&format!("  {} {}\n", "warning:".yellow().bold(), warning));
        }
        if review.mutated {
            let pretty = serde_json::to_string_pretty(object).unwrap_or_else(|_| "{}".to_string());
            output.push('\n');
            output.push_str(&Self::indent(&pretty, "  "));
            output.push('\n');
        }
        output
    }

    pub fn format_admission_rejected(kind: &str, name: &str, error: &ValidationError) -> String {
        let mut output = format!(
            "{} {} {} rejected\n",
            "✗".red().bold(),
            kind,
            name.bold()
        );
        for field in &error.errors {
            output.push_str(&format!(
                "  {} {}\n",
                format!("{}:", field.field).red(),
                field.message
            ));
        }
        output
    }

    pub fn format_vote_receipt(proposal: &str, agent: &str, receipt: &VoteReceipt) -> String {
        let mut output = String::new();
        match receipt.outcome {
            VoteOutcome::Recorded => output.push_str(&format!(
                "{} vote by {} recorded on {}\n",
                "✓".green().bold(),
                agent.bold(),
                proposal.bold()
            )),
            VoteOutcome::Duplicate => output.push_str(&format!(
                "{} identical vote by {} already on {}; nothing changed\n",
                "=".yellow().bold(),
                agent.bold(),
                proposal.bold()
            )),
        }
        output.push_str(&Self::field("Phase", receipt.phase.as_str()));
        let score = match receipt.consensus_score {
            Some(score) => format!("{:.2}", score),
            None => "n/a".to_string(),
        };
        output.push_str(&Self::field("Score", &score));
        if receipt.consensus_reached {
            output.push_str(&format!("  {}\n", "Consensus reached".green().bold()));
        }
        if receipt.attempts > 1 {
            output.push_str(&format!(
                "  {}\n",
                format!("applied after {} attempts", receipt.attempts).dimmed()
            ));
        }
        output
    }

    pub fn format_license(license: &VerifiedLicense, seats_in_use: u32) -> String {
        let claims = &license.claims;
        let mut output = String::new();
        output.push_str(&Self::header("Licence"));
        output.push('\n');
        output.push_str(&format!("{} {}\n\n", "Status:".cyan().bold(), "VALID".green().bold()));
        output.push_str(&Self::field("Licensee", &claims.licensee));
        output.push_str(&Self::field("Customer", &claims.customer_id));
        output.push_str(&Self::field("Tier", claims.tier.as_str()));

        let seats = if claims.max_seats == 0 {
            format!("{} in use, unlimited", seats_in_use)
        } else {
            format!("{} of {} in use", seats_in_use, claims.max_seats)
        };
        output.push_str(&Self::field("Seats", &seats));
        output.push_str(&Self::field("Expires", &claims.expires_at_utc().to_rfc3339()));
        if !claims.features.is_empty() {
            output.push_str(&Self::field("Features", &claims.features.join(", ")));
        }
        if let Some(warning) = &license.warning {
            output.push_str(&format!("\n{} {}\n", "warning:".yellow().bold(), warning));
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        let mut output = String::new();
        for issue in issues {
            let level = match issue.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            output.push_str(&format!("{} [{}]: {}\n", level, issue.key.cyan(), issue.message));
        }
        output
    }

    pub fn format_config_report(report: &ConfigReport) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Configuration"));
        output.push('\n');

        output.push_str(&Self::section_header("Sources (highest priority first)"));
        for source in &report.sources {
            let marker = if source.found {
                "✓".green()
            } else {
                "-".dimmed()
            };
            match &source.location {
                Some(location) => {
                    output.push_str(&format!("  {} {:<12} {}\n", marker, source.name, location))
                }
                None => output.push_str(&format!("  {} {}\n", marker, source.name)),
            }
        }

        output.push_str(&Self::section_header("Effective values"));
        if let Some(sections) = report.effective.as_object() {
            for (section, values) in sections {
                output.push_str(&format!("\n{}\n", format!("[{}]", section).yellow().bold()));
                if let Some(values) = values.as_object() {
                    for (key, value) in values {
                        output.push_str(&format!("  {} = {}\n", key, Self::scalar(value)));
                    }
                }
            }
        }

        if !report.issues.is_empty() {
            output.push_str(&Self::section_header("Issues"));
            output.push_str(&Self::format_config_issues(&report.issues));
        }
        output.push_str(&Self::footer());
        output
    }

    fn scalar(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => "(unset)".dimmed().to_string(),
            other => other.to_string(),
        }
    }

    fn field(label: &str, value: &str) -> String {
        format!("  {:<12} {}\n", format!("{}:", label).bold(), value)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn policy_decision(&self, decision: &PolicyDecision) -> String {
        Self::format_policy_decision(decision)
    }

    fn admission_accepted(
        &self,
        kind: &str,
        name: &str,
        review: &AdmissionReview,
        object: &serde_json::Value,
    ) -> String {
        Self::format_admission_accepted(kind, name, review, object)
    }

    fn admission_rejected(&self, kind: &str, name: &str, error: &ValidationError) -> String {
        Self::format_admission_rejected(kind, name, error)
    }

    fn vote_receipt(&self, proposal: &str, agent: &str, receipt: &VoteReceipt) -> String {
        Self::format_vote_receipt(proposal, agent, receipt)
    }

    fn license(&self, license: &VerifiedLicense, seats_in_use: u32) -> String {
        Self::format_license(license, seats_in_use)
    }

    fn config_issues(&self, issues: &[ConfigIssue]) -> String {
        Self::format_config_issues(issues)
    }

    fn config_report(&self, report: &ConfigReport) -> String {
        Self::format_config_report(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::formatter::SourceEntry;
    use conductor_domain::{PolicyInput, PolicyMode, ProposalPhase, evaluate};
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_policy_decision_lists_reasons() {
        plain();
        let decision = evaluate(&PolicyInput::new("delete_volume", 0.5, 90), PolicyMode::Base);
        let text = ConsoleFormatter::format_policy_decision(&decision);
        assert!(text.contains("delete_volume"));
        assert!(text.contains("DENIED"));
        assert!(text.contains("DESTRUCTIVE"));
        for reason in &decision.reasons {
            assert!(text.contains(reason.as_str()));
        }
    }

    #[test]
    fn test_admission_rejected_lists_fields() {
        plain();
        let mut error = ValidationError::single("spec.title", "must be at least 10 characters");
        error.push(conductor_domain::FieldError::new("spec.voters", "must not be empty"));
        let text = ConsoleFormatter::format_admission_rejected("AgenticProposal", "p1", &error);
        assert!(text.contains("AgenticProposal p1 rejected"));
        assert!(text.contains("spec.title: must be at least 10 characters"));
        assert!(text.contains("spec.voters: must not be empty"));
    }

    #[test]
    fn test_admission_accepted_shows_warnings() {
        plain();
        let review = AdmissionReview {
            mutated: false,
            warnings: vec!["spec.engineEndpoint is not reachable".to_string()],
        };
        let text =
            ConsoleFormatter::format_admission_accepted("AgentWorkload", "w1", &review, &json!({}));
        assert!(text.contains("AgentWorkload w1 admitted"));
        assert!(text.contains("warning: spec.engineEndpoint is not reachable"));
        assert!(!text.contains("defaults applied"));
    }

    #[test]
    fn test_vote_receipt() {
        plain();
        let receipt = VoteReceipt {
            outcome: VoteOutcome::Recorded,
            phase: ProposalPhase::Approved,
            consensus_score: Some(90.0),
            consensus_reached: true,
            attempts: 2,
        };
        let text = ConsoleFormatter::format_vote_receipt("scale-down", "reviewer-a", &receipt);
        assert!(text.contains("vote by reviewer-a recorded on scale-down"));
        assert!(text.contains("90.00"));
        assert!(text.contains("Consensus reached"));
        assert!(text.contains("applied after 2 attempts"));
    }

    #[test]
    fn test_config_issues() {
        plain();
        let text = ConsoleFormatter::format_config_issues(&[
            ConfigIssue::error("controller.workers", "must be at least 1"),
            ConfigIssue::warning("license.token", "no licence configured"),
        ]);
        assert_eq!(
            text,
            "error [controller.workers]: must be at least 1\nwarning [license.token]: no licence configured\n"
        );
    }

    #[test]
    fn test_config_report_renders_sections() {
        plain();
        let report = ConfigReport {
            sources: vec![
                SourceEntry {
                    name: "project".to_string(),
                    location: Some("./conductor.toml".to_string()),
                    found: false,
                },
                SourceEntry {
                    name: "defaults".to_string(),
                    location: None,
                    found: true,
                },
            ],
            effective: json!({"controller": {"workers": 4}, "license": {"token": null}}),
            issues: Vec::new(),
        };
        let text = ConsoleFormatter::format_config_report(&report);
        assert!(text.contains("./conductor.toml"));
        assert!(text.contains("[controller]"));
        assert!(text.contains("workers = 4"));
        assert!(text.contains("token = (unset)"));
        assert!(!text.contains("Issues"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
