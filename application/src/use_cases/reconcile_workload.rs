//! Workload reconciler
//!
//! One pass drives an `AgentWorkload` toward its declared state:
//!
//! ```text
//! defaults + validation → licence → template → create workflow
//!     → observe → (suspended) gate actions → resume → write status
//! ```
//!
//! Only the status sub-resource is written. Defaults are applied to an
//! in-memory copy of the spec.

use super::policy_gate::{GateOutcome, PolicyGate};
use super::shared::{ReconcileError, RequeuePolicy, cancellable};
use super::workflow_lifecycle::{LifecycleError, WorkflowLifecycleManager};
use crate::ports::audit_logger::{
    AuditEvent, AuditLogger, LICENSE_CHECKED, NoAuditLogger, WORKFLOW_RESUMED,
};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::cluster::{ResourceStore, WorkflowEngine};
use crate::ports::license_source::LicenseSource;
use chrono::{DateTime, Utc};
use conductor_domain::workload::{
    self as workloads, AppliedProposal, DEFAULT_AUTO_APPROVE_THRESHOLD,
};
use conductor_domain::{
    Action, AgentWorkload, AgenticProposal, Approval, CONDITION_ACTIONS_DENIED,
    CONDITION_AWAITING_APPROVAL, CONDITION_DEGRADED, CONDITION_READY, Condition,
    ConditionStatus, ErrorKind, LicenseError, LicenseVerifier, PolicyMode, Workflow,
    WorkflowDefaults, WorkflowPhase, WorkloadPhase,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spec values after defaulting, parsed once per pass.
struct Desired {
    workload: AgentWorkload,
    mode: PolicyMode,
    threshold: f64,
}

pub struct ReconcileWorkloadUseCase<S, E>
where
    S: ResourceStore + 'static,
    E: WorkflowEngine + 'static,
{
    store: Arc<S>,
    lifecycle: WorkflowLifecycleManager<E>,
    verifier: LicenseVerifier,
    license: Arc<dyn LicenseSource>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
    gate: PolicyGate,
    running_requeue: Duration,
}

impl<S, E> ReconcileWorkloadUseCase<S, E>
where
    S: ResourceStore + 'static,
    E: WorkflowEngine + 'static,
{
    pub fn new(
        store: Arc<S>,
        engine: Arc<E>,
        defaults: WorkflowDefaults,
        verifier: LicenseVerifier,
        license: Arc<dyn LicenseSource>,
    ) -> Self {
        let audit: Arc<dyn AuditLogger> = Arc::new(NoAuditLogger);
        Self {
            store,
            lifecycle: WorkflowLifecycleManager::new(engine, defaults),
            verifier,
            license,
            clock: Arc::new(SystemClock),
            gate: PolicyGate::new(audit.clone()),
            audit,
            running_requeue: Duration::from_secs(30),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.lifecycle = self.lifecycle.with_audit_logger(audit.clone());
        self.gate = PolicyGate::new(audit.clone());
        self.audit = audit;
        self
    }

    pub fn with_running_requeue(mut self, delay: Duration) -> Self {
        self.running_requeue = delay;
        self
    }

    pub fn lifecycle(&self) -> &WorkflowLifecycleManager<E> {
        &self.lifecycle
    }

    /// Reconcile the workload `namespace/name` once.
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<RequeuePolicy, ReconcileError> {
        let fetched = cancellable(cancel, async {
            self.store
                .get_workload(namespace, name)
                .await
                .map_err(ReconcileError::from)
        })
        .await;
        let mut workload = match fetched {
            Ok(w) => w,
            Err(e) if e.is_not_found() => {
                debug!("Workload is gone; nothing to do");
                return Ok(RequeuePolicy::Never);
            }
            Err(e) => return Err(e),
        };

        if workload.is_settled() {
            debug!(
                phase = %workload.status.phase,
                generation = workload.metadata.generation,
                "Workload settled for this generation; waiting for a spec change"
            );
            return Ok(RequeuePolicy::Never);
        }

        if workload.status.phase == WorkloadPhase::Failed {
            // New generation after a terminal failure: start over.
            workload.status.phase = WorkloadPhase::Pending;
        }

        let now = self.clock.now();
        let requeue = self.drive(&mut workload, now, cancel).await?;

        workload.status.observed_generation = workload.metadata.generation;
        workload.status.last_reconcile_time = Some(now);
        cancellable(cancel, async {
            self.store
                .update_workload_status(&workload)
                .await
                .map_err(ReconcileError::from)
        })
        .await?;

        debug!(phase = %workload.status.phase, ?requeue, "Workload reconciled");
        Ok(requeue)
    }

    async fn drive(
        &self,
        workload: &mut AgentWorkload,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RequeuePolicy, ReconcileError> {
        let desired = match self.desired(workload) {
            Ok(d) => d,
            Err(message) => {
                warn!(error = %message, "Workload spec rejected");
                fail(workload, ErrorKind::ValidationFailed, message, now);
                return Ok(RequeuePolicy::Never);
            }
        };

        if let Some(requeue) = self.check_license(workload, now, cancel).await? {
            return Ok(requeue);
        }

        if workload.status.phase == WorkloadPhase::Pending {
            match self.lifecycle.validate_template(cancel).await {
                Ok(_) => {}
                Err(e @ LifecycleError::TemplateMissing { .. }) => {
                    warn!(error = %e, "Workflow template missing");
                    degrade(workload, e.kind(), e.to_string(), now);
                    return Ok(RequeuePolicy::Backoff);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if workload.status.workflow_name.is_none() {
            let outcome = self.lifecycle.create(&desired.workload, cancel).await?;
            workload.status.workflow_name = Some(outcome.workflow().name().to_string());
        }
        let workflow_name = workload.status.workflow_name.clone().unwrap_or_default();

        let namespace = self.lifecycle.defaults().namespace.clone();
        let (workflow, state) = match self
            .lifecycle
            .observe(&namespace, &workflow_name, cancel)
            .await
        {
            Ok(observed) => observed,
            Err(e) if e.is_not_found() => {
                info!(workflow = %workflow_name, "Workflow disappeared; will recreate");
                workload.status.phase = WorkloadPhase::Pending;
                workload.status.workflow_name = None;
                workload.status.message = format!("workflow {} not found", workflow_name);
                return Ok(RequeuePolicy::Backoff);
            }
            Err(e) => return Err(e.into()),
        };

        workload.status.phase = state.phase.workload_phase();
        workload.status.message = match &state.current_node {
            Some(node) if state.message.is_empty() => format!("running {}", node),
            _ => state.message.clone(),
        };

        if state.phase == WorkflowPhase::Suspended {
            self.gate_suspended(&desired, workload, &workflow, now, cancel)
                .await?;
        } else {
            workload.status.conditions.remove(CONDITION_AWAITING_APPROVAL);
        }

        let failed = workload.status.phase == WorkloadPhase::Failed;
        workload.status.conditions.set(Condition::new(
            CONDITION_DEGRADED,
            ConditionStatus::from_bool(failed),
            if failed { "WorkflowFailed" } else { "Reconciled" },
            if failed { state.message.clone() } else { String::new() },
            now,
        ));
        workload.status.conditions.set(Condition::new(
            CONDITION_READY,
            ConditionStatus::from_bool(!failed),
            state.phase.as_str(),
            String::new(),
            now,
        ));

        Ok(match workload.status.phase {
            WorkloadPhase::Pending | WorkloadPhase::Running => {
                RequeuePolicy::After(self.running_requeue)
            }
            WorkloadPhase::Completed | WorkloadPhase::Failed => RequeuePolicy::Never,
        })
    }

    fn desired(&self, workload: &AgentWorkload) -> Result<Desired, String> {
        let mut copy = workload.clone();
        workloads::apply_defaults(&mut copy);
        workloads::validate(&copy.spec).map_err(|e| e.to_string())?;
        let mode = copy.spec.parse_policy_mode().map_err(|e| e.to_string())?;
        let threshold = copy
            .spec
            .parse_auto_approve_threshold()
            .unwrap_or(DEFAULT_AUTO_APPROVE_THRESHOLD);
        Ok(Desired {
            workload: copy,
            mode,
            threshold,
        })
    }

    /// `Some(requeue)` when the licence stops this pass.
    async fn check_license(
        &self,
        workload: &mut AgentWorkload,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Option<RequeuePolicy>, ReconcileError> {
        let all = cancellable(cancel, async {
            self.store
                .list_workloads(None)
                .await
                .map_err(ReconcileError::from)
        })
        .await?;
        let seats = seats_in_use(&all, workload);

        let result = match self.license.token() {
            Some(token) => self.verifier.enforce(&token, now, seats),
            None => Err(LicenseError::Missing),
        };

        match result {
            Ok(license) => {
                if let Some(warning) = &license.warning {
                    warn!(customer = %license.claims.customer_id, "{}", warning);
                }
                self.audit.log(AuditEvent::new(
                    LICENSE_CHECKED,
                    json!({
                        "workload": workload.key().to_string(),
                        "valid": true,
                        "customer": license.claims.customer_id,
                        "tier": license.claims.tier.as_str(),
                        "seatsInUse": seats,
                        "maxSeats": license.claims.max_seats,
                    }),
                ));
                Ok(None)
            }
            Err(e) => {
                let kind = e.kind();
                warn!(error = %e, kind = %kind, "Licence check failed");
                self.audit.log(AuditEvent::new(
                    LICENSE_CHECKED,
                    json!({
                        "workload": workload.key().to_string(),
                        "valid": false,
                        "kind": kind.as_str(),
                        "error": e.to_string(),
                        "seatsInUse": seats,
                    }),
                ));
                if kind == ErrorKind::SeatLimit {
                    degrade(workload, kind, e.to_string(), now);
                    Ok(Some(RequeuePolicy::Backoff))
                } else {
                    fail(workload, kind, e.to_string(), now);
                    Ok(Some(RequeuePolicy::Never))
                }
            }
        }
    }

    async fn gate_suspended(
        &self,
        desired: &Desired,
        workload: &mut AgentWorkload,
        workflow: &Workflow,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let proposals = cancellable(cancel, async {
            self.store
                .list_proposals(Some(workload.namespace()))
                .await
                .map_err(ReconcileError::from)
        })
        .await?;
        let proposal = match latest_gating(&proposals, workload.name()) {
            Some(p) if workload.status.has_applied(p) => {
                debug!(proposal = %p.name(), "Proposal already resumed this workflow once");
                None
            }
            other => other,
        };

        let outcome = match proposal {
            Some(p) if p.status.phase.is_approved() => {
                let plan = &p.spec.execution_plan;
                let health = plan
                    .cluster_health
                    .or(workload.status.cluster_health)
                    .unwrap_or(0);
                let actions = plan.actions.iter().map(|a| {
                    Action::new(&a.name, a.confidence, now).with_description(&a.description)
                });
                let outcome = self.gate.gate(&workload.key(), desired.mode, health, actions);
                // Consensus alone approves a plan with no actions to gate.
                if !outcome.is_empty() && !outcome.any_allowed() {
                    deny_all(workload, &outcome, now);
                    return Ok(());
                }
                outcome
            }
            Some(p) => {
                debug!(proposal = %p.name(), phase = %p.status.phase, "Awaiting consensus");
                workload.status.conditions.set(Condition::new(
                    CONDITION_AWAITING_APPROVAL,
                    ConditionStatus::True,
                    p.status.phase.as_str(),
                    format!("proposal {} is {}", p.name(), p.status.phase),
                    now,
                ));
                return Ok(());
            }
            None => {
                let eligible: Vec<Action> = workload
                    .status
                    .pending_actions()
                    .filter(|a| a.confidence.rounded() + 1e-9 >= desired.threshold)
                    .cloned()
                    .collect();
                if eligible.is_empty() {
                    workload.status.conditions.set(Condition::new(
                        CONDITION_AWAITING_APPROVAL,
                        ConditionStatus::True,
                        "NoProposal",
                        "no approved proposal and no action above the auto-approve threshold",
                        now,
                    ));
                    return Ok(());
                }
                let health = workload.status.cluster_health.unwrap_or(0);
                let outcome = self.gate.gate(&workload.key(), desired.mode, health, eligible);
                for gated in &outcome.gated {
                    for proposed in workload
                        .status
                        .proposed_actions
                        .iter_mut()
                        .filter(|a| a.name == gated.action.name && a.approved.is_unset())
                    {
                        proposed.approved = Approval::from_allowed(gated.decision.allowed);
                    }
                }
                if !outcome.any_allowed() {
                    deny_all(workload, &outcome, now);
                    return Ok(());
                }
                outcome
            }
        };

        self.lifecycle.resume(workflow, cancel).await?;
        record_executed(workload, &outcome);
        if let Some(p) = proposal {
            workload.status.applied_proposal = Some(AppliedProposal::of(p));
        }
        self.audit.log(AuditEvent::new(
            WORKFLOW_RESUMED,
            json!({
                "workload": workload.key().to_string(),
                "workflow": workflow.name(),
                "proposal": proposal.map(|p| p.name()),
                "allowed": outcome.allowed().map(|g| g.action.name.as_str()).collect::<Vec<_>>(),
                "denied": outcome.denied_names(),
            }),
        ));

        workload.status.phase = WorkloadPhase::Running;
        workload.status.conditions.set(Condition::new(
            CONDITION_AWAITING_APPROVAL,
            ConditionStatus::False,
            "Resumed",
            String::new(),
            now,
        ));
        let denied = outcome.denied_names();
        workload.status.conditions.set(Condition::new(
            CONDITION_ACTIONS_DENIED,
            ConditionStatus::from_bool(!denied.is_empty()),
            if denied.is_empty() { "AllAllowed" } else { "PolicyDenied" },
            denied.join(", "),
            now,
        ));
        Ok(())
    }
}

/// Workloads created before `workload` that still hold a seat.
fn seats_in_use(all: &[AgentWorkload], workload: &AgentWorkload) -> u32 {
    let rank = |w: &AgentWorkload| {
        (
            w.metadata.creation_timestamp,
            w.metadata.name.clone(),
            w.metadata.namespace.clone(),
        )
    };
    let mine = rank(workload);
    let count = all
        .iter()
        .filter(|w| {
            !matches!(
                w.status.phase,
                WorkloadPhase::Completed | WorkloadPhase::Failed
            )
        })
        .filter(|w| rank(w) < mine)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// The most recently created proposal that gates `workload`.
fn latest_gating<'a>(
    proposals: &'a [AgenticProposal],
    workload: &str,
) -> Option<&'a AgenticProposal> {
    proposals
        .iter()
        .filter(|p| p.gates(workload))
        .max_by(|a, b| {
            (a.metadata.creation_timestamp, &a.metadata.name)
                .cmp(&(b.metadata.creation_timestamp, &b.metadata.name))
        })
}

fn record_executed(workload: &mut AgentWorkload, outcome: &GateOutcome) {
    for action in outcome.approved_actions() {
        if !workload
            .status
            .executed_actions
            .iter()
            .any(|a| a.name == action.name)
        {
            workload.status.executed_actions.push(action);
        }
    }
}

fn deny_all(workload: &mut AgentWorkload, outcome: &GateOutcome, now: DateTime<Utc>) {
    let denied = outcome.denied_names();
    warn!(actions = ?denied, "Every gated action was denied; workflow stays suspended");
    workload.status.conditions.set(Condition::new(
        CONDITION_ACTIONS_DENIED,
        ConditionStatus::True,
        "AllActionsDenied",
        denied.join(", "),
        now,
    ));
}

fn degrade(workload: &mut AgentWorkload, kind: ErrorKind, message: String, now: DateTime<Utc>) {
    workload.status.conditions.set(Condition::new(
        CONDITION_DEGRADED,
        ConditionStatus::True,
        kind.as_str(),
        message.clone(),
        now,
    ));
    workload.status.message = message;
}

fn fail(workload: &mut AgentWorkload, kind: ErrorKind, message: String, now: DateTime<Utc>) {
    workload.status.phase = WorkloadPhase::Failed;
    workload.status.conditions.set(Condition::new(
        CONDITION_READY,
        ConditionStatus::False,
        kind.as_str(),
        String::new(),
        now,
    ));
    degrade(workload, kind, message, now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::FixedClock;
    use crate::ports::license_source::StaticLicense;
    use crate::testing::{FakeCluster, RecordingAudit};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use conductor_domain::license::{IssueRequest, issue};
    use conductor_domain::proposal::{ExecutionPlan, PlanType, PlannedAction, ProposedBy};
    use conductor_domain::workflow::{SUSPENDED_CONDITION, WorkflowCondition};
    use conductor_domain::{
        Confidence, ConsensusThreshold, ProposalPhase, ProposalSpec, Voter, WorkloadSpec,
    };
    use ed25519_dalek::SigningKey;

    const TEST_SECRET: [u8; 32] = [
        0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c,
        0xc4, 0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae,
        0x7f, 0x60,
    ];
    const WF_NS: &str = "argo-workflows";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn token(seats: i64) -> String {
        let request = IssueRequest {
            licensee: "Acme Corp".to_string(),
            customer_id: None,
            tier: "enterprise".to_string(),
            seats,
            days: 365,
            features: vec![],
        };
        issue(&request, &SigningKey::from_bytes(&TEST_SECRET), now()).unwrap()
    }

    fn verifier() -> LicenseVerifier {
        LicenseVerifier::new(SigningKey::from_bytes(&TEST_SECRET).verifying_key())
    }

    fn workload(name: &str, created_minutes: i64) -> AgentWorkload {
        let mut w = AgentWorkload::new(
            "team-a",
            name,
            WorkloadSpec {
                workload_type: "ceph".to_string(),
                engine_endpoint: "http://browserless:3000".to_string(),
                objective: "Rebalance placement groups".to_string(),
                agents: vec!["planner".to_string()],
                ..Default::default()
            },
        );
        w.metadata.uid = format!("uid-{}", name);
        w.metadata.generation = 1;
        w.metadata.creation_timestamp = Some(now() - ChronoDuration::minutes(created_minutes));
        w
    }

    struct Harness {
        cluster: Arc<FakeCluster>,
        audit: Arc<RecordingAudit>,
        clock: Arc<FixedClock>,
        use_case: ReconcileWorkloadUseCase<FakeCluster, FakeCluster>,
    }

    fn harness(license: Option<String>) -> Harness {
        let cluster = Arc::new(FakeCluster::new());
        cluster.add_template(WF_NS, "agentic-pipeline");
        let audit = Arc::new(RecordingAudit::default());
        let clock = Arc::new(FixedClock::new(now()));
        let use_case = ReconcileWorkloadUseCase::new(
            cluster.clone(),
            cluster.clone(),
            WorkflowDefaults::default(),
            verifier(),
            Arc::new(StaticLicense::new(license)),
        )
        .with_clock(clock.clone())
        .with_audit_logger(audit.clone());
        Harness {
            cluster,
            audit,
            clock,
            use_case,
        }
    }

    fn suspend(cluster: &FakeCluster, name: &str) {
        cluster.set_workflow_status(WF_NS, name, |status| {
            status.phase = "Running".to_string();
            status.conditions = vec![WorkflowCondition {
                condition_type: SUSPENDED_CONDITION.to_string(),
                status: "True".to_string(),
                message: String::new(),
            }];
        });
    }

    fn approved_proposal(actions: Vec<(&str, f64)>) -> AgenticProposal {
        let mut plan = ExecutionPlan::new(PlanType::Manual);
        for (name, confidence) in actions {
            plan = plan.with_action(PlannedAction {
                name: name.to_string(),
                description: String::new(),
                confidence: Confidence::new(confidence).unwrap(),
            });
        }
        plan.cluster_health = Some(85);
        let mut p = AgenticProposal::new(
            "team-a",
            "p-1",
            ProposalSpec {
                title: "Rebalance the ceph cluster".to_string(),
                description: "Move placement groups off the two hottest OSDs before the backup window starts.".to_string(),
                proposed_by: ProposedBy {
                    agent: "planner".to_string(),
                    timestamp: None,
                },
                consensus_threshold: ConsensusThreshold::default(),
                voters: vec![Voter::new("planner", 1.0)],
                execution_plan: plan,
                workload_ref: Some("job-1".to_string()),
                voting_deadline: None,
                related_proposals: vec![],
            },
        );
        p.status.phase = ProposalPhase::Approved;
        p
    }

    async fn run(h: &Harness, name: &str) -> RequeuePolicy {
        h.use_case
            .reconcile("team-a", name, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_pass_creates_workflow() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));

        let requeue = run(&h, "job-1").await;
        assert_eq!(requeue, RequeuePolicy::After(Duration::from_secs(30)));

        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Pending);
        assert_eq!(stored.status.workflow_name.as_deref(), Some("job-1"));
        assert_eq!(stored.status.observed_generation, 1);
        assert_eq!(stored.status.last_reconcile_time, Some(now()));
        // The stored spec is left as written.
        assert!(stored.spec.auto_approve_threshold.is_none());

        let wf = h.cluster.workflow(WF_NS, "job-1").unwrap();
        assert_eq!(wf.metadata.owner_references[0].uid, "uid-job-1");
        assert_eq!(h.audit.count(LICENSE_CHECKED), 1);
    }

    #[tokio::test]
    async fn test_invalid_spec_parks_workload() {
        let h = harness(Some(token(5)));
        let mut w = workload("job-1", 10);
        w.spec.agents.clear();
        h.cluster.insert_workload(w);

        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Failed);
        let degraded = stored.status.conditions.get(CONDITION_DEGRADED).unwrap();
        assert_eq!(degraded.reason, "ValidationFailed");
        assert!(stored.is_settled());
        assert!(h.cluster.workflow(WF_NS, "job-1").is_none());

        // Same generation: skipped without a write.
        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);
    }

    #[tokio::test]
    async fn test_missing_licence_fails() {
        let h = harness(None);
        h.cluster.insert_workload(workload("job-1", 10));
        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Failed);
        assert_eq!(
            stored.status.conditions.get(CONDITION_DEGRADED).unwrap().reason,
            "MalformedToken"
        );
    }

    #[tokio::test]
    async fn test_seat_limit_degrades_and_backs_off() {
        let h = harness(Some(token(1)));
        h.cluster.insert_workload(workload("job-0", 20));
        h.cluster.insert_workload(workload("job-1", 10));

        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Backoff);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Pending);
        assert_eq!(
            stored.status.conditions.get(CONDITION_DEGRADED).unwrap().reason,
            "SeatLimit"
        );
        assert!(h.cluster.workflow(WF_NS, "job-1").is_none());

        // The earliest workload holds the seat.
        run(&h, "job-0").await;
        assert!(h.cluster.workflow(WF_NS, "job-0").is_some());
    }

    #[tokio::test]
    async fn test_missing_template_backs_off() {
        let cluster = Arc::new(FakeCluster::new());
        let use_case = ReconcileWorkloadUseCase::new(
            cluster.clone(),
            cluster.clone(),
            WorkflowDefaults::default(),
            verifier(),
            Arc::new(StaticLicense::new(Some(token(5)))),
        )
        .with_clock(Arc::new(FixedClock::new(now())));
        cluster.insert_workload(workload("job-1", 10));

        let requeue = use_case
            .reconcile("team-a", "job-1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(requeue, RequeuePolicy::Backoff);
        let stored = cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(
            stored.status.conditions.get(CONDITION_DEGRADED).unwrap().reason,
            "NotFound"
        );
        assert!(cluster.workflow(WF_NS, "job-1").is_none());
    }

    #[tokio::test]
    async fn test_phase_mirrors_engine() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;

        h.cluster.set_workflow_status(WF_NS, "job-1", |s| s.phase = "Succeeded".to_string());
        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Completed);
    }

    async fn complete(h: &Harness, name: &str) {
        h.cluster.insert_workload(workload(name, 10));
        run(h, name).await;
        h.cluster
            .set_workflow_status(WF_NS, name, |s| s.phase = "Succeeded".to_string());
        assert_eq!(run(h, name).await, RequeuePolicy::Never);
        let stored = h.cluster.workload("team-a", name).unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Completed);
    }

    #[tokio::test]
    async fn test_completed_workload_ignores_expired_licence() {
        let h = harness(Some(token(5)));
        complete(&h, "job-1").await;
        let before = h.cluster.workload("team-a", "job-1").unwrap();

        h.clock.advance(ChronoDuration::days(400));
        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);

        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Completed);
        assert!(!stored.status.conditions.is_true(CONDITION_DEGRADED));
        assert_eq!(stored.metadata.resource_version, before.metadata.resource_version);
        assert_eq!(h.audit.count(LICENSE_CHECKED), 2);
    }

    #[tokio::test]
    async fn test_completed_workload_is_not_rerun_after_workflow_gc() {
        let h = harness(Some(token(5)));
        complete(&h, "job-1").await;
        h.cluster.remove_workflow(WF_NS, "job-1");

        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);
        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Never);

        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Completed);
        assert_eq!(stored.status.workflow_name.as_deref(), Some("job-1"));
        assert!(h.cluster.workflow(WF_NS, "job-1").is_none());
    }

    #[tokio::test]
    async fn test_completed_workload_wakes_on_spec_change() {
        let h = harness(Some(token(5)));
        complete(&h, "job-1").await;
        let mut changed = h.cluster.workload("team-a", "job-1").unwrap();
        changed.metadata.generation = 2;
        h.cluster.insert_workload(changed);

        run(&h, "job-1").await;
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.observed_generation, 2);
        assert_eq!(h.audit.count(LICENSE_CHECKED), 3);
    }

    #[tokio::test]
    async fn test_deleted_workflow_is_recreated() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        h.cluster.remove_workflow(WF_NS, "job-1");

        assert_eq!(run(&h, "job-1").await, RequeuePolicy::Backoff);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.phase, WorkloadPhase::Pending);
        assert!(stored.status.workflow_name.is_none());

        run(&h, "job-1").await;
        assert!(h.cluster.workflow(WF_NS, "job-1").is_some());
    }

    #[tokio::test]
    async fn test_approved_proposal_resumes_with_allowed_actions() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");
        h.cluster.insert_proposal(approved_proposal(vec![
            ("get_status", 0.5),
            ("delete_volume", 0.95),
            ("optimize_resources", 0.99),
        ]));

        run(&h, "job-1").await;

        let wf = h.cluster.workflow(WF_NS, "job-1").unwrap();
        assert!(!wf.is_suspended());
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        let executed: Vec<&str> = stored
            .status
            .executed_actions
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(executed, vec!["get_status", "optimize_resources"]);
        let denied = stored.status.conditions.get(CONDITION_ACTIONS_DENIED).unwrap();
        assert!(denied.is_true());
        assert_eq!(denied.message, "delete_volume");
        assert_eq!(h.audit.count(WORKFLOW_RESUMED), 1);
    }

    #[tokio::test]
    async fn test_approval_resumes_one_suspension_only() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");
        let mut first = approved_proposal(vec![("optimize_resources", 0.99)]);
        first.metadata.uid = "uid-p-1".to_string();
        first.metadata.creation_timestamp = Some(now() - ChronoDuration::minutes(5));
        h.cluster.insert_proposal(first.clone());

        run(&h, "job-1").await;
        assert!(!h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        let applied = stored.status.applied_proposal.as_ref().unwrap();
        assert_eq!((applied.name.as_str(), applied.uid.as_str()), ("p-1", "uid-p-1"));

        // The proposal finishes executing, then the pipeline suspends again.
        first.status.phase = ProposalPhase::Completed;
        h.cluster.insert_proposal(first);
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");

        run(&h, "job-1").await;
        assert!(h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        let awaiting = stored.status.conditions.get(CONDITION_AWAITING_APPROVAL).unwrap();
        assert!(awaiting.is_true());
        assert_eq!(awaiting.reason, "NoProposal");
        assert_eq!(h.audit.count(WORKFLOW_RESUMED), 1);

        // A fresh approval resumes the second suspension.
        let mut second = approved_proposal(vec![("optimize_resources", 0.99)]);
        second.metadata.name = "p-2".to_string();
        second.metadata.uid = "uid-p-2".to_string();
        second.metadata.creation_timestamp = Some(now());
        h.cluster.insert_proposal(second);

        run(&h, "job-1").await;
        assert!(!h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        let resumed: Vec<_> = h
            .audit
            .events()
            .into_iter()
            .filter(|e| e.event_type == WORKFLOW_RESUMED)
            .map(|e| e.payload["proposal"].clone())
            .collect();
        assert_eq!(resumed, vec![json!("p-1"), json!("p-2")]);
    }

    #[tokio::test]
    async fn test_recreated_proposal_with_same_name_is_fresh() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");
        let mut p = approved_proposal(vec![("optimize_resources", 0.99)]);
        p.metadata.uid = "uid-old".to_string();
        h.cluster.insert_proposal(p.clone());
        run(&h, "job-1").await;

        suspend(&h.cluster, "job-1");
        p.metadata.uid = "uid-new".to_string();
        h.cluster.insert_proposal(p);
        run(&h, "job-1").await;

        assert!(!h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        assert_eq!(h.audit.count(WORKFLOW_RESUMED), 2);
    }

    #[tokio::test]
    async fn test_all_denied_stays_suspended() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");
        h.cluster
            .insert_proposal(approved_proposal(vec![("delete_volume", 0.95)]));

        run(&h, "job-1").await;

        assert!(h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        assert_eq!(h.cluster.patch_count(), 0);
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert!(stored.status.conditions.is_true(CONDITION_ACTIONS_DENIED));
        assert!(stored.status.executed_actions.is_empty());
    }

    #[tokio::test]
    async fn test_pending_proposal_waits() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");
        let mut p = approved_proposal(vec![("optimize_resources", 0.99)]);
        p.status.phase = ProposalPhase::InReview;
        h.cluster.insert_proposal(p);

        run(&h, "job-1").await;

        assert!(h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        let awaiting = stored.status.conditions.get(CONDITION_AWAITING_APPROVAL).unwrap();
        assert!(awaiting.is_true());
        assert_eq!(awaiting.reason, "InReview");
    }

    #[tokio::test]
    async fn test_auto_approval_without_proposal() {
        let h = harness(Some(token(5)));
        let mut w = workload("job-1", 10);
        w.status.cluster_health = Some(90);
        w.status.proposed_actions = vec![
            Action::new("optimize_resources", Confidence::new(0.97).unwrap(), now()),
            Action::new("scale_down", Confidence::new(0.6).unwrap(), now()),
        ];
        h.cluster.insert_workload(w);
        run(&h, "job-1").await;
        suspend(&h.cluster, "job-1");

        run(&h, "job-1").await;

        assert!(!h.cluster.workflow(WF_NS, "job-1").unwrap().is_suspended());
        let stored = h.cluster.workload("team-a", "job-1").unwrap();
        assert_eq!(stored.status.proposed_actions[0].approved, Approval::Approved);
        assert_eq!(stored.status.proposed_actions[1].approved, Approval::Unset);
        assert_eq!(stored.status.executed_actions.len(), 1);
        assert_eq!(stored.status.executed_actions[0].name, "optimize_resources");
    }

    #[tokio::test]
    async fn test_conflict_on_status_write_surfaces() {
        let h = harness(Some(token(5)));
        h.cluster.insert_workload(workload("job-1", 10));
        h.cluster.inject_conflicts(1);
        let err = h
            .use_case
            .reconcile("team-a", "job-1", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictRetry);
        assert_eq!(RequeuePolicy::for_error(err.kind()), RequeuePolicy::Immediate);
    }

    #[tokio::test]
    async fn test_deleted_workload_is_dropped() {
        let h = harness(Some(token(5)));
        assert_eq!(run(&h, "ghost").await, RequeuePolicy::Never);
    }
}
