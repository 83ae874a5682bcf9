//! Defaulting and validation for `AgentWorkload` admission.
//!
//! [`validate`] collects every problem instead of stopping at the first one,
//! so a rejected create/update reports all bad fields at once.

use super::entities::{AgentWorkload, WorkloadSpec};
use crate::core::error::{FieldError, ValidationError};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_AUTO_APPROVE_THRESHOLD: f64 = 0.95;
pub const DEFAULT_AUTO_APPROVE_THRESHOLD_TEXT: &str = "0.95";
pub const DEFAULT_POLICY_MODE: &str = "strict";
pub const MAX_OBJECTIVE_LEN: usize = 1000;

static AGENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("AGENT_ID regex should compile")
});

static THRESHOLD_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[01](\.\d{1,2})?$").expect("THRESHOLD_TEXT regex should compile")
});

/// DNS-label style agent identifier.
pub fn is_valid_agent_id(id: &str) -> bool {
    AGENT_ID.is_match(id)
}

/// Fill unset fields. Returns whether anything changed.
pub fn apply_defaults(workload: &mut AgentWorkload) -> bool {
    let mut changed = false;
    let spec = &mut workload.spec;
    if spec.auto_approve_threshold.is_none() {
        spec.auto_approve_threshold = Some(DEFAULT_AUTO_APPROVE_THRESHOLD_TEXT.to_string());
        changed = true;
    }
    if spec.policy_mode.is_none() {
        spec.policy_mode = Some(DEFAULT_POLICY_MODE.to_string());
        changed = true;
    }
    changed
}

pub fn validate(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    if let Err(e) = spec.parse_type() {
        errors.push(e);
    }
    if let Err(e) = validate_endpoint("spec.engineEndpoint", &spec.engine_endpoint) {
        errors.push(e);
    }

    let objective_len = spec.objective.chars().count();
    if objective_len == 0 || objective_len > MAX_OBJECTIVE_LEN {
        errors.push(FieldError::new(
            "spec.objective",
            format!(
                "length must be between 1 and {}, got {}",
                MAX_OBJECTIVE_LEN, objective_len
            ),
        ));
    }

    if spec.agents.is_empty() {
        errors.push(FieldError::new("spec.agents", "must not be empty"));
    }
    for (i, agent) in spec.agents.iter().enumerate() {
        if !is_valid_agent_id(agent) {
            errors.push(FieldError::new(
                format!("spec.agents[{}]", i),
                format!("{:?} must match {}", agent, AGENT_ID.as_str()),
            ));
        }
    }

    if let Some(text) = spec.auto_approve_threshold.as_deref() {
        if !THRESHOLD_TEXT.is_match(text) {
            errors.push(FieldError::new(
                "spec.autoApproveThreshold",
                format!("{:?} must match {}", text, THRESHOLD_TEXT.as_str()),
            ));
        } else {
            match spec.parse_auto_approve_threshold() {
                Ok(v) if (0.0..=1.0).contains(&v) => {}
                Ok(v) => errors.push(FieldError::new(
                    "spec.autoApproveThreshold",
                    format!("must be within [0, 1], got {}", v),
                )),
                Err(e) => errors.push(e),
            }
        }
    }

    if let Err(e) = spec.parse_policy_mode() {
        errors.push(e);
    }

    for (i, target) in spec.target_urls.iter().enumerate() {
        if let Err(e) = validate_endpoint(&format!("spec.targetUrls[{}]", i), target) {
            errors.push(e);
        }
    }

    errors.into_result()
}

/// `http`/`https` URL with a non-empty host.
pub fn validate_endpoint(field: &str, raw: &str) -> Result<Url, FieldError> {
    let url = Url::parse(raw)
        .map_err(|e| FieldError::new(field, format!("{:?} is not a valid URL: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FieldError::new(
            field,
            format!("scheme must be http or https, got {}", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FieldError::new(field, "host must not be empty"));
    }
    Ok(url)
}
