//! Projection of an engine workflow's status into what the reconciler needs.

use super::object::{SUSPENDED_CONDITION, Workflow};
use crate::workload::WorkloadPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkflowPhase {
    #[default]
    Pending,
    Running,
    Suspended,
    Succeeded,
    Failed,
    Error,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Pending => "Pending",
            WorkflowPhase::Running => "Running",
            WorkflowPhase::Suspended => "Suspended",
            WorkflowPhase::Succeeded => "Succeeded",
            WorkflowPhase::Failed => "Failed",
            WorkflowPhase::Error => "Error",
        }
    }

    /// Engine phase string; empty or unrecognised reads as `Pending`.
    pub fn from_engine(raw: &str) -> Self {
        match raw {
            "Running" => WorkflowPhase::Running,
            "Suspended" => WorkflowPhase::Suspended,
            "Succeeded" => WorkflowPhase::Succeeded,
            "Failed" => WorkflowPhase::Failed,
            "Error" => WorkflowPhase::Error,
            _ => WorkflowPhase::Pending,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            WorkflowPhase::Succeeded | WorkflowPhase::Failed | WorkflowPhase::Error
        )
    }

    /// Phase mirrored onto the owning workload.
    pub fn workload_phase(&self) -> WorkloadPhase {
        match self {
            WorkflowPhase::Pending => WorkloadPhase::Pending,
            WorkflowPhase::Running | WorkflowPhase::Suspended => WorkloadPhase::Running,
            WorkflowPhase::Succeeded => WorkloadPhase::Completed,
            WorkflowPhase::Failed | WorkflowPhase::Error => WorkloadPhase::Failed,
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub phase: WorkflowPhase,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub suspended: bool,
    pub current_node: Option<String>,
    pub nodes: NodeCounts,
}

impl Workflow {
    /// True iff a `Suspended` condition with status `True` is present.
    pub fn is_suspended(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|c| c.condition_type == SUSPENDED_CONDITION && c.status == "True")
    }

    pub fn node_counts(&self) -> NodeCounts {
        let mut counts = NodeCounts {
            total: self.status.nodes.len(),
            ..Default::default()
        };
        for node in self.status.nodes.values() {
            match node.phase.as_str() {
                "Succeeded" => counts.successful += 1,
                "Failed" | "Error" => counts.failed += 1,
                _ => {}
            }
        }
        counts
    }

    /// Display name of the first node still running, in node-id order.
    pub fn current_node(&self) -> Option<String> {
        self.status
            .nodes
            .values()
            .find(|n| n.phase == "Running")
            .map(|n| n.display_name.clone())
    }

    pub fn state(&self) -> WorkflowState {
        let suspended = self.is_suspended();
        let engine_phase = WorkflowPhase::from_engine(&self.status.phase);
        let phase = if suspended && !engine_phase.is_finished() {
            WorkflowPhase::Suspended
        } else {
            engine_phase
        };
        WorkflowState {
            phase,
            message: self.status.message.clone(),
            started_at: self.status.started_at,
            finished_at: self.status.finished_at,
            suspended,
            current_node: self.current_node(),
            nodes: self.node_counts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::object::{WorkflowCondition, WorkflowNode};
    use crate::workflow::params::WorkflowDefaults;
    use crate::workflow::object::build_workflow;
    use crate::workload::{AgentWorkload, WorkloadSpec};

    fn workflow() -> Workflow {
        let w = AgentWorkload::new("ns", "job-1", WorkloadSpec::default());
        build_workflow(&w, &WorkflowDefaults::default()).unwrap()
    }

    fn condition(t: &str, status: &str) -> WorkflowCondition {
        WorkflowCondition {
            condition_type: t.to_string(),
            status: status.to_string(),
            message: String::new(),
        }
    }

    fn node(name: &str, phase: &str) -> WorkflowNode {
        WorkflowNode {
            display_name: name.to_string(),
            phase: phase.to_string(),
            node_type: "Pod".to_string(),
        }
    }

    #[test]
    fn test_suspended_requires_true_status() {
        let mut wf = workflow();
        assert!(!wf.is_suspended());
        wf.status.conditions = vec![condition("Suspended", "False")];
        assert!(!wf.is_suspended());
        wf.status.conditions = vec![condition("Completed", "True")];
        assert!(!wf.is_suspended());
        wf.status.conditions = vec![condition("Suspended", "True")];
        assert!(wf.is_suspended());
    }

    #[test]
    fn test_state_projection() {
        let mut wf = workflow();
        wf.status.phase = "Running".to_string();
        wf.status.conditions = vec![condition("Suspended", "True")];
        wf.status.nodes.insert("job-1-a".to_string(), node("scrape", "Succeeded"));
        wf.status.nodes.insert("job-1-b".to_string(), node("analyze", "Running"));
        wf.status.nodes.insert("job-1-c".to_string(), node("report", "Error"));

        let state = wf.state();
        assert_eq!(state.phase, WorkflowPhase::Suspended);
        assert!(state.suspended);
        assert_eq!(state.current_node.as_deref(), Some("analyze"));
        assert_eq!(
            state.nodes,
            NodeCounts {
                successful: 1,
                failed: 1,
                total: 3
            }
        );
    }

    #[test]
    fn test_finished_phase_wins_over_stale_suspension() {
        let mut wf = workflow();
        wf.status.phase = "Succeeded".to_string();
        wf.status.conditions = vec![condition("Suspended", "True")];
        assert_eq!(wf.state().phase, WorkflowPhase::Succeeded);
    }

    #[test]
    fn test_empty_status_is_pending() {
        assert_eq!(workflow().state().phase, WorkflowPhase::Pending);
    }

    #[test]
    fn test_workload_phase_mapping() {
        assert_eq!(WorkflowPhase::Pending.workload_phase(), WorkloadPhase::Pending);
        assert_eq!(WorkflowPhase::Suspended.workload_phase(), WorkloadPhase::Running);
        assert_eq!(WorkflowPhase::Succeeded.workload_phase(), WorkloadPhase::Completed);
        assert_eq!(WorkflowPhase::Error.workload_phase(), WorkloadPhase::Failed);
    }
}
