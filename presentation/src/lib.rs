//! Presentation layer for agentic-conductor
//!
//! This crate contains the clap definitions of both binaries and the
//! formatters that render operator command results as coloured text or
//! JSON.

pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{
    BackendArg, Cli, Command, EvaluateArgs, OperationArg, RunArgs, ValidateArgs, VerifyLicenseArgs,
    VoteArgs,
};
pub use cli::license::LicenseCli;
pub use config::OutputConfig;
pub use output::console::ConsoleFormatter;
pub use output::formatter::{ConfigReport, OutputFormatter, SourceEntry};
pub use output::json::JsonFormatter;
