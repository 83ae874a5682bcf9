//! Presentation-level configuration
//!
//! Resolves how results are rendered from the command line flags and the
//! `[output]` section of the configuration file.

use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use crate::output::json::JsonFormatter;
use conductor_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Command line flags win over the file; JSON output is never coloured.
    pub fn resolve(
        cli_format: Option<OutputFormat>,
        no_color: bool,
        file_format: Option<OutputFormat>,
        file_color: bool,
    ) -> Self {
        let format = cli_format.or(file_format).unwrap_or_default();
        Self {
            format,
            color: format == OutputFormat::Text && file_color && !no_color,
        }
    }

    /// Apply the colour setting process-wide.
    pub fn apply(&self) {
        if !self.color {
            colored::control::set_override(false);
        }
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        match self.format {
            OutputFormat::Text => Box::new(ConsoleFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}
