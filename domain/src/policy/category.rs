//! Action classification by destructiveness.
//!
//! Classification is a two-phase token match on the lower-cased action
//! type: exact membership in a token set, then `<token>_` as a prefix.
//! There is no substring matching, so `optimize_resources` never matches
//! `monitor` and `dropdown_refresh` never matches `drop`.

use serde::{Deserialize, Serialize};

const DESTRUCTIVE_TOKENS: &[&str] = &[
    "delete", "remove", "purge", "drop", "reset", "cleanup", "clear",
];

const READONLY_TOKENS: &[&str] = &[
    "get", "list", "describe", "monitor", "analyze", "read", "check", "validate",
];

/// How much an action can change the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionCategory {
    Destructive,
    ReadOnly,
    Modification,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Destructive => "DESTRUCTIVE",
            ActionCategory::ReadOnly => "READONLY",
            ActionCategory::Modification => "MODIFICATION",
        }
    }

    /// Classify an action type.
    ///
    /// Destructive tokens are checked first, so an action that could match
    /// both sets is treated as destructive.
    pub fn classify(action_type: &str) -> Self {
        let normalized = action_type.trim().to_lowercase();
        if matches_any(&normalized, DESTRUCTIVE_TOKENS) {
            ActionCategory::Destructive
        } else if matches_any(&normalized, READONLY_TOKENS) {
            ActionCategory::ReadOnly
        } else {
            ActionCategory::Modification
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn matches_any(action: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| matches_token(action, token))
}

fn matches_token(action: &str, token: &str) -> bool {
    action == token
        || action
            .strip_prefix(token)
            .is_some_and(|rest| rest.starts_with('_'))
}

/// Tokens that classify an action as read-only.
pub fn readonly_tokens() -> &'static [&'static str] {
    READONLY_TOKENS
}

/// Tokens that classify an action as destructive.
pub fn destructive_tokens() -> &'static [&'static str] {
    DESTRUCTIVE_TOKENS
}
