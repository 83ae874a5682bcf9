//! Actions proposed by agents while a workload runs.

use crate::core::confidence::Confidence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human (or automatic) verdict on a proposed action.
///
/// Serialised as an optional boolean: absent means [`Approval::Unset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Approval {
    #[default]
    Unset,
    Approved,
    Denied,
}

impl Approval {
    pub fn is_unset(&self) -> bool {
        matches!(self, Approval::Unset)
    }

    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Approval::Approved
        } else {
            Approval::Denied
        }
    }
}

impl From<Option<bool>> for Approval {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Approval::Unset,
            Some(true) => Approval::Approved,
            Some(false) => Approval::Denied,
        }
    }
}

impl From<Approval> for Option<bool> {
    fn from(value: Approval) -> Self {
        match value {
            Approval::Unset => None,
            Approval::Approved => Some(true),
            Approval::Denied => Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub confidence: Confidence,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Approval::is_unset")]
    pub approved: Approval,
}

impl Action {
    pub fn new(name: impl Into<String>, confidence: Confidence, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            confidence,
            timestamp,
            approved: Approval::Unset,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_approval(mut self, approved: Approval) -> Self {
        self.approved = approved;
        self
    }
}
