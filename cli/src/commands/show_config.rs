//! `conductor show-config`

use anyhow::Result;
use conductor_infrastructure::config::ConfigSource;
use conductor_infrastructure::{ConfigLoader, FileConfig};
use conductor_presentation::{ConfigReport, OutputFormatter, SourceEntry};
use std::path::Path;
use std::process::ExitCode;

fn entry(source: ConfigSource) -> SourceEntry {
    match source {
        ConfigSource::Environment { prefix } => SourceEntry {
            name: "environment".to_string(),
            location: Some(format!("{}*", prefix)),
            found: true,
        },
        ConfigSource::Explicit { path, found } => SourceEntry {
            name: "--config".to_string(),
            location: Some(path.display().to_string()),
            found,
        },
        ConfigSource::Project { path, found } => SourceEntry {
            name: "project".to_string(),
            location: Some(path.display().to_string()),
            found,
        },
        ConfigSource::Defaults => SourceEntry {
            name: "defaults".to_string(),
            location: None,
            found: true,
        },
    }
}

/// Exits 1 when the configuration has errors.
pub fn execute(
    loader: &ConfigLoader,
    config_path: Option<&Path>,
    no_config: bool,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
) -> Result<ExitCode> {
    let sources = if no_config {
        vec![ConfigSource::Defaults]
    } else {
        loader.sources(config_path)
    };
    let report = ConfigReport {
        sources: sources.into_iter().map(entry).collect(),
        effective: serde_json::to_value(config)?,
        issues: config.validate(),
    };
    println!("{}", formatter.config_report(&report));

    Ok(if report.issues.iter().any(|i| i.is_error()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
