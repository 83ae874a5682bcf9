//! Proposal reconciler
//!
//! Moves an `AgenticProposal` through review, calculation and execution.
//! Votes arrive through [`super::cast_vote`]; this pass only advances the
//! phase machine and runs the plan once the proposal is approved.

use super::shared::{ReconcileError, RequeuePolicy, cancellable};
use crate::ports::audit_logger::{AuditEvent, AuditLogger, CONSENSUS_REACHED, NoAuditLogger};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::cluster::ResourceStore;
use crate::ports::plan_executor::PlanExecutor;
use chrono::{DateTime, Utc};
use conductor_domain::proposal as proposals;
use conductor_domain::{
    AgenticProposal, CONDITION_CONSENSUS, CONDITION_DEGRADED, Condition, ConditionStatus,
    PhaseEvent, ProposalPhase, ProposalStatus,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest delay before re-checking a voting deadline.
const MIN_DEADLINE_REQUEUE: Duration = Duration::from_secs(1);

pub struct ReconcileProposalUseCase<S, X>
where
    S: ResourceStore + 'static,
    X: PlanExecutor + 'static,
{
    store: Arc<S>,
    executor: Arc<X>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
}

impl<S, X> ReconcileProposalUseCase<S, X>
where
    S: ResourceStore + 'static,
    X: PlanExecutor + 'static,
{
    pub fn new(store: Arc<S>, executor: Arc<X>) -> Self {
        Self {
            store,
            executor,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<RequeuePolicy, ReconcileError> {
        let fetched = cancellable(cancel, async {
            self.store
                .get_proposal(namespace, name)
                .await
                .map_err(ReconcileError::from)
        })
        .await;
        let mut proposal = match fetched {
            Ok(p) => p,
            Err(e) if e.is_not_found() => {
                debug!("Proposal is gone; nothing to do");
                return Ok(RequeuePolicy::Never);
            }
            Err(e) => return Err(e),
        };

        let now = self.clock.now();
        let before = proposal.status.clone();
        proposal.status.observed_generation = proposal.metadata.generation;

        if let Err(e) = proposals::validate(&proposal.spec) {
            warn!(error = %e, "Proposal spec rejected");
            proposal.status.conditions.set(Condition::new(
                CONDITION_DEGRADED,
                ConditionStatus::True,
                e.kind().as_str(),
                e.to_string(),
                now,
            ));
            self.persist_if_changed(&mut proposal, &before, cancel).await?;
            return Ok(RequeuePolicy::Never);
        }
        proposal.status.conditions.remove(CONDITION_DEGRADED);

        let events = proposal.advance(now)?;
        if events
            .iter()
            .any(|e| matches!(e, PhaseEvent::ThresholdMet | PhaseEvent::ThresholdMissed))
        {
            self.record_consensus(&mut proposal, now);
        }

        let needs_execution = match proposal.status.phase {
            ProposalPhase::Approved => {
                proposal.start_execution(now)?;
                true
            }
            ProposalPhase::Executing => proposal.status.execution_result.is_none(),
            _ => false,
        };
        self.persist_if_changed(&mut proposal, &before, cancel).await?;

        if needs_execution {
            self.execute(&mut proposal, cancel).await?;
        }

        Ok(requeue_for(&proposal, now))
    }

    fn record_consensus(&self, proposal: &mut AgenticProposal, now: DateTime<Utc>) {
        let reached = proposal.status.consensus_reached;
        let score = proposal.status.consensus_score;
        let threshold = proposal.spec.consensus_threshold;
        info!(
            proposal = %proposal.name(),
            score = ?score,
            threshold = %threshold,
            reached,
            "Consensus calculated"
        );
        self.audit.log(AuditEvent::new(
            CONSENSUS_REACHED,
            json!({
                "proposal": proposal.key().to_string(),
                "score": score,
                "threshold": threshold.value(),
                "reached": reached,
                "phase": proposal.status.phase.as_str(),
                "votes": proposal.status.votes.len(),
                "discardedVoters": proposal.status.discarded_voters,
            }),
        ));
        let message = match score {
            Some(s) => format!("score {:.1} against required {}", s, threshold.required_score()),
            None => "no counted votes".to_string(),
        };
        proposal.status.conditions.set(Condition::new(
            CONDITION_CONSENSUS,
            ConditionStatus::from_bool(reached),
            proposal.status.phase.as_str(),
            message,
            now,
        ));
    }

    async fn execute(
        &self,
        proposal: &mut AgenticProposal,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        info!(
            proposal = %proposal.name(),
            plan = %proposal.spec.execution_plan.plan_type,
            "Executing approved plan"
        );
        let snapshot = proposal.clone();
        let result = cancellable(cancel, async {
            Ok::<_, ReconcileError>(self.executor.execute(&snapshot).await)
        })
        .await?;
        if result.success {
            info!(proposal = %proposal.name(), message = %result.message, "Plan executed");
        } else {
            warn!(proposal = %proposal.name(), message = %result.message, "Plan failed");
        }

        let before = proposal.status.clone();
        proposal.finish_execution(result, self.clock.now())?;
        self.persist_if_changed(proposal, &before, cancel).await
    }

    async fn persist_if_changed(
        &self,
        proposal: &mut AgenticProposal,
        before: &ProposalStatus,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        if &proposal.status == before {
            return Ok(());
        }
        let stored = cancellable(cancel, async {
            self.store
                .update_proposal_status(&*proposal)
                .await
                .map_err(ReconcileError::from)
        })
        .await?;
        proposal.metadata.resource_version = stored.metadata.resource_version;
        Ok(())
    }
}

/// Re-check an open vote when its deadline passes.
fn requeue_for(proposal: &AgenticProposal, now: DateTime<Utc>) -> RequeuePolicy {
    match (proposal.status.phase, proposal.spec.voting_deadline) {
        (ProposalPhase::InReview, Some(deadline)) if deadline > now => {
            let wait = (deadline - now).to_std().unwrap_or(MIN_DEADLINE_REQUEUE);
            RequeuePolicy::After(wait.max(MIN_DEADLINE_REQUEUE))
        }
        _ => RequeuePolicy::Never,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::FixedClock;
    use crate::ports::plan_executor::DelegatingPlanExecutor;
    use crate::testing::{FakeCluster, RecordingAudit};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use conductor_domain::proposal::{ExecutionPlan, PlanType, ProposedBy};
    use conductor_domain::{ConsensusThreshold, ExecutionResult, ProposalSpec, Vote, Voter};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
    }

    fn proposal() -> AgenticProposal {
        AgenticProposal::new(
            "team-a",
            "p-1",
            ProposalSpec {
                title: "Rotate archival credentials".to_string(),
                description: "Rotate the credentials used by the archival agents before the audit window opens.".to_string(),
                proposed_by: ProposedBy {
                    agent: "planner".to_string(),
                    timestamp: None,
                },
                consensus_threshold: ConsensusThreshold::new(0.7).unwrap(),
                voters: vec![
                    Voter::new("a", 1.0),
                    Voter::new("b", 2.0),
                    Voter::new("c", 1.0),
                ],
                execution_plan: ExecutionPlan::new(PlanType::Manual),
                workload_ref: Some("job-1".to_string()),
                voting_deadline: None,
                related_proposals: vec![],
            },
        )
    }

    struct FailingExecutor;

    #[async_trait]
    impl PlanExecutor for FailingExecutor {
        async fn execute(&self, _proposal: &AgenticProposal) -> ExecutionResult {
            ExecutionResult::failed("hook returned 500")
        }
    }

    fn use_case<X: PlanExecutor + 'static>(
        cluster: &Arc<FakeCluster>,
        executor: X,
        audit: &Arc<RecordingAudit>,
    ) -> ReconcileProposalUseCase<FakeCluster, X> {
        ReconcileProposalUseCase::new(cluster.clone(), Arc::new(executor))
            .with_clock(Arc::new(FixedClock::new(now())))
            .with_audit_logger(audit.clone())
    }

    fn with_votes(mut p: AgenticProposal, votes: Vec<Vote>) -> AgenticProposal {
        for vote in votes {
            p.cast_vote(vote, now()).unwrap();
        }
        p
    }

    #[tokio::test]
    async fn test_rejected_when_score_below_threshold() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        cluster.insert_proposal(with_votes(
            proposal(),
            vec![
                Vote::approve("a", 90),
                Vote::conditional("b", 80),
                Vote::reject("c", 0),
            ],
        ));

        let requeue = use_case(&cluster, DelegatingPlanExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(requeue, RequeuePolicy::Never);

        let stored = cluster.proposal("team-a", "p-1").unwrap();
        assert_eq!(stored.status.phase, ProposalPhase::Rejected);
        assert_eq!(stored.status.consensus_score, Some(52.5));
        assert!(!stored.status.consensus_reached);
        assert!(!stored.status.conditions.is_true(CONDITION_CONSENSUS));
        assert_eq!(audit.count(CONSENSUS_REACHED), 1);
    }

    #[tokio::test]
    async fn test_approved_plan_is_executed() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        cluster.insert_proposal(with_votes(
            proposal(),
            vec![
                Vote::approve("a", 90),
                Vote::approve("b", 85),
                Vote::approve("c", 80),
            ],
        ));

        use_case(&cluster, DelegatingPlanExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();

        let stored = cluster.proposal("team-a", "p-1").unwrap();
        assert_eq!(stored.status.phase, ProposalPhase::Completed);
        assert!(stored.status.conditions.is_true(CONDITION_CONSENSUS));
        assert_eq!(stored.status.execution_started_at, Some(now()));
        let result = stored.status.execution_result.unwrap();
        assert!(result.success);
        assert!(result.message.contains("manual"));
    }

    #[tokio::test]
    async fn test_failed_execution_recorded() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        cluster.insert_proposal(with_votes(
            proposal(),
            vec![
                Vote::approve("a", 100),
                Vote::approve("b", 100),
                Vote::approve("c", 100),
            ],
        ));

        use_case(&cluster, FailingExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();

        let stored = cluster.proposal("team-a", "p-1").unwrap();
        assert_eq!(stored.status.phase, ProposalPhase::Failed);
        assert_eq!(
            stored.status.execution_result.unwrap().message,
            "hook returned 500"
        );
    }

    #[tokio::test]
    async fn test_open_vote_requeues_at_deadline() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        let mut p = proposal();
        p.spec.voting_deadline = Some(now() + ChronoDuration::minutes(10));
        cluster.insert_proposal(with_votes(p, vec![Vote::approve("a", 90)]));

        let requeue = use_case(&cluster, DelegatingPlanExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(requeue, RequeuePolicy::After(Duration::from_secs(600)));
        assert_eq!(
            cluster.proposal("team-a", "p-1").unwrap().status.phase,
            ProposalPhase::InReview
        );
        assert_eq!(audit.count(CONSENSUS_REACHED), 0);
    }

    #[tokio::test]
    async fn test_unvoted_proposal_is_untouched() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        let mut p = proposal();
        p.spec.voting_deadline = Some(now() - ChronoDuration::minutes(10));
        cluster.insert_proposal(p);

        use_case(&cluster, DelegatingPlanExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();
        let stored = cluster.proposal("team-a", "p-1").unwrap();
        assert_eq!(stored.status.phase, ProposalPhase::Pending);
    }

    #[tokio::test]
    async fn test_invalid_spec_is_degraded() {
        let cluster = Arc::new(FakeCluster::new());
        let audit = Arc::new(RecordingAudit::default());
        let mut p = proposal();
        p.spec.title = "short".to_string();
        cluster.insert_proposal(p);

        let requeue = use_case(&cluster, DelegatingPlanExecutor, &audit)
            .reconcile("team-a", "p-1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(requeue, RequeuePolicy::Never);
        let stored = cluster.proposal("team-a", "p-1").unwrap();
        let degraded = stored.status.conditions.get(CONDITION_DEGRADED).unwrap();
        assert_eq!(degraded.reason, "ValidationFailed");
    }
}
