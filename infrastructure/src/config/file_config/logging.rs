//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving the decision audit trail
    pub audit_file: Option<PathBuf>,
    /// File receiving a copy of the diagnostic log
    pub file: Option<PathBuf>,
}
