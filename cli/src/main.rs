//! CLI entrypoint for conductor
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod logging;
mod manifest;

use anyhow::Result;
use clap::Parser;
use conductor_infrastructure::ConfigLoader;
use conductor_presentation::{Cli, Command, OutputConfig};
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loader = ConfigLoader::new();
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        loader.load(cli.config.as_deref())?
    };

    // Held until exit so the log file is flushed
    let _log_guard = logging::init(cli.verbose, config.logging.file.as_deref())?;
    debug!(backend = ?config.controller.backend, "Configuration loaded");

    let output = OutputConfig::resolve(
        cli.format,
        cli.no_color,
        config.output.format,
        config.output.color,
    );
    output.apply();
    let formatter = output.formatter();

    match cli.command {
        Command::Run(args) => commands::run::execute(args, config).await,
        Command::Evaluate(args) => commands::evaluate::execute(args, formatter.as_ref()),
        Command::Validate(args) => {
            commands::validate::execute(args, &config, formatter.as_ref()).await
        }
        Command::Vote(args) => commands::vote::execute(args, &config, formatter.as_ref()).await,
        Command::VerifyLicense(args) => {
            commands::verify_license::execute(args, &config, formatter.as_ref())
        }
        Command::ShowConfig => commands::show_config::execute(
            &loader,
            cli.config.as_deref(),
            cli.no_config,
            &config,
            formatter.as_ref(),
        ),
    }
}
