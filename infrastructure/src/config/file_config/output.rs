//! Output configuration from TOML (`[output]` section)

use conductor_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// How the operator commands print their results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format; `--format` on the command line wins
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}
