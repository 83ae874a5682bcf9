//! Defaulting and validation for `AgenticProposal` admission.

use super::entities::{AgenticProposal, PlanType, ProposalSpec};
use crate::core::error::{FieldError, ValidationError};
use crate::quorum::{MAX_VOTER_WEIGHT, MIN_VOTER_WEIGHT};
use crate::workload::validation::{is_valid_agent_id, validate_endpoint};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub const MIN_TITLE_LEN: usize = 10;
pub const MAX_TITLE_LEN: usize = 200;
pub const MIN_DESCRIPTION_LEN: usize = 50;

/// Stamp `proposedBy.timestamp` when the proposer left it out.
pub fn apply_defaults(proposal: &mut AgenticProposal, now: DateTime<Utc>) -> bool {
    if proposal.spec.proposed_by.timestamp.is_none() {
        proposal.spec.proposed_by.timestamp = Some(now);
        return true;
    }
    false
}

pub fn validate(spec: &ProposalSpec) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    let title_len = spec.title.chars().count();
    if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&title_len) {
        errors.push(FieldError::new(
            "spec.title",
            format!(
                "length must be between {} and {}, got {}",
                MIN_TITLE_LEN, MAX_TITLE_LEN, title_len
            ),
        ));
    }
    let description_len = spec.description.chars().count();
    if description_len < MIN_DESCRIPTION_LEN {
        errors.push(FieldError::new(
            "spec.description",
            format!(
                "must be at least {} characters, got {}",
                MIN_DESCRIPTION_LEN, description_len
            ),
        ));
    }
    if !is_valid_agent_id(&spec.proposed_by.agent) {
        errors.push(FieldError::new(
            "spec.proposedBy.agent",
            format!("{:?} is not a valid agent id", spec.proposed_by.agent),
        ));
    }
    if let Err(e) = spec.consensus_threshold.validate() {
        errors.push(e);
    }

    if spec.voters.is_empty() {
        errors.push(FieldError::new("spec.voters", "must not be empty"));
    }
    let mut seen = BTreeSet::new();
    for (i, voter) in spec.voters.iter().enumerate() {
        if !is_valid_agent_id(&voter.agent) {
            errors.push(FieldError::new(
                format!("spec.voters[{}].agent", i),
                format!("{:?} is not a valid agent id", voter.agent),
            ));
        }
        if !seen.insert(voter.agent.as_str()) {
            errors.push(FieldError::new(
                format!("spec.voters[{}].agent", i),
                format!("duplicate voter {:?}", voter.agent),
            ));
        }
        let weights = MIN_VOTER_WEIGHT..=MAX_VOTER_WEIGHT;
        if !voter.weight.is_finite() || !weights.contains(&voter.weight) {
            errors.push(FieldError::new(
                format!("spec.voters[{}].weight", i),
                format!(
                    "must be within [{}, {}], got {}",
                    MIN_VOTER_WEIGHT, MAX_VOTER_WEIGHT, voter.weight
                ),
            ));
        }
    }

    validate_plan(spec, &mut errors);
    errors.into_result()
}

fn validate_plan(spec: &ProposalSpec, errors: &mut ValidationError) {
    let plan = &spec.execution_plan;

    if let Some(required) = plan.plan_type.required_parameter()
        && plan.parameter_str(required).is_none()
    {
        errors.push(FieldError::new(
            format!("spec.executionPlan.parameters.{}", required),
            format!("required for {} plans", plan.plan_type),
        ));
    }
    if plan.plan_type == PlanType::Webhook
        && let Some(url) = plan.parameter_str("url")
        && let Err(e) = validate_endpoint("spec.executionPlan.parameters.url", url)
    {
        errors.push(e);
    }
    for (i, action) in plan.actions.iter().enumerate() {
        if action.name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("spec.executionPlan.actions[{}].name", i),
                "must not be empty",
            ));
        }
    }
    if let Some(health) = plan.cluster_health
        && health > 100
    {
        errors.push(FieldError::new(
            "spec.executionPlan.clusterHealth",
            format!("must be within [0, 100], got {}", health),
        ));
    }
}
