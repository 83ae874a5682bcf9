//! Policy gate
//!
//! Runs candidate actions through the policy evaluator in the workload's
//! mode and records one `policy_decision` audit event per distinct action.

use crate::ports::audit_logger::{AuditEvent, AuditLogger, POLICY_DECISION};
use conductor_domain::{
    Action, Approval, PolicyDecision, PolicyInput, PolicyMode, ResourceKey, evaluate,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// An action together with the verdict it received.
#[derive(Debug, Clone, PartialEq)]
pub struct GatedAction {
    pub action: Action,
    pub decision: PolicyDecision,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateOutcome {
    pub gated: Vec<GatedAction>,
}

impl GateOutcome {
    pub fn allowed(&self) -> impl Iterator<Item = &GatedAction> {
        self.gated.iter().filter(|g| g.decision.allowed)
    }

    pub fn denied(&self) -> impl Iterator<Item = &GatedAction> {
        self.gated.iter().filter(|g| !g.decision.allowed)
    }

    pub fn any_allowed(&self) -> bool {
        self.allowed().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.gated.is_empty()
    }

    /// Allowed actions, stamped as approved.
    pub fn approved_actions(&self) -> Vec<Action> {
        self.allowed()
            .map(|g| g.action.clone().with_approval(Approval::Approved))
            .collect()
    }

    pub fn denied_names(&self) -> Vec<String> {
        self.denied().map(|g| g.action.name.clone()).collect()
    }
}

pub struct PolicyGate {
    audit: Arc<dyn AuditLogger>,
}

impl PolicyGate {
    pub fn new(audit: Arc<dyn AuditLogger>) -> Self {
        Self { audit }
    }

    /// Evaluate `actions` for `subject`. An action name seen earlier in the
    /// same call reuses the earlier verdict.
    pub fn gate(
        &self,
        subject: &ResourceKey,
        mode: PolicyMode,
        cluster_health: u8,
        actions: impl IntoIterator<Item = Action>,
    ) -> GateOutcome {
        let mut seen: HashMap<String, PolicyDecision> = HashMap::new();
        let mut outcome = GateOutcome::default();

        for action in actions {
            if let Some(decision) = seen.get(&action.name) {
                debug!(action = %action.name, "Reusing verdict for repeated action");
                outcome.gated.push(GatedAction {
                    action,
                    decision: decision.clone(),
                });
                continue;
            }

            let input = PolicyInput::new(&action.name, action.confidence.value(), cluster_health);
            let decision = evaluate(&input, mode);
            info!(
                subject = %subject,
                action = %action.name,
                allowed = decision.allowed,
                category = %decision.category,
                band = %decision.band,
                mode = %mode,
                "Policy decision"
            );
            self.audit.log(AuditEvent::new(
                POLICY_DECISION,
                json!({
                    "subject": subject.to_string(),
                    "action": action.name,
                    "confidence": action.confidence,
                    "clusterHealth": cluster_health,
                    "mode": mode.as_str(),
                    "allowed": decision.allowed,
                    "category": decision.category.as_str(),
                    "band": decision.band.as_str(),
                    "reasons": decision.reasons,
                }),
            ));
            seen.insert(action.name.clone(), decision.clone());
            outcome.gated.push(GatedAction { action, decision });
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingAudit;
    use chrono::{TimeZone, Utc};
    use conductor_domain::Confidence;

    fn action(name: &str, confidence: f64) -> Action {
        Action::new(
            name,
            Confidence::new(confidence).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    fn subject() -> ResourceKey {
        ResourceKey::workload("team-a", "job-1")
    }

    #[test]
    fn test_mixed_verdicts() {
        let audit = Arc::new(RecordingAudit::default());
        let gate = PolicyGate::new(audit.clone());
        let outcome = gate.gate(
            &subject(),
            PolicyMode::Strict,
            85,
            vec![
                action("get_status", 0.5),
                action("delete_volume", 0.95),
                action("optimize_resources", 0.99),
            ],
        );

        assert!(outcome.any_allowed());
        assert_eq!(outcome.denied_names(), vec!["delete_volume".to_string()]);
        let approved = outcome.approved_actions();
        assert_eq!(approved.len(), 2);
        assert!(approved.iter().all(|a| a.approved == Approval::Approved));
        assert_eq!(audit.count(POLICY_DECISION), 3);
    }

    #[test]
    fn test_repeated_action_reuses_verdict() {
        let audit = Arc::new(RecordingAudit::default());
        let gate = PolicyGate::new(audit.clone());
        let outcome = gate.gate(
            &subject(),
            PolicyMode::Permissive,
            75,
            vec![
                action("optimize_resources", 0.85),
                action("optimize_resources", 0.2),
            ],
        );
        assert_eq!(outcome.gated.len(), 2);
        assert!(outcome.gated.iter().all(|g| g.decision.allowed));
        assert_eq!(audit.count(POLICY_DECISION), 1);
    }

    #[test]
    fn test_critical_health_denies_modification() {
        let gate = PolicyGate::new(Arc::new(RecordingAudit::default()));
        let outcome = gate.gate(
            &subject(),
            PolicyMode::Strict,
            0,
            vec![action("optimize_resources", 0.99)],
        );
        assert!(!outcome.any_allowed());
    }
}
