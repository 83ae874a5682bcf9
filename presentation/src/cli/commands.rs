//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use conductor_domain::{OutputFormat, PolicyMode, VoteDecision};
use std::path::PathBuf;

/// Cluster backend selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// In-process store; state is lost on exit
    Memory,
    /// Kubernetes API server
    Kubernetes,
}

/// Admission operation replayed by `validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OperationArg {
    #[default]
    Create,
    Update,
    Delete,
}

/// CLI arguments for conductor
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(author, version, about = "Control plane for agentic workloads")]
#[command(long_about = r#"
Conductor admits AgentWorkload and AgenticProposal resources, materialises
each workload as a workflow on the workflow engine, and resumes suspended
workflows once a weighted vote of agents approves the gated actions.

Configuration is loaded from (in priority order):
1. CONDUCTOR_* environment variables (CONDUCTOR_CONTROLLER__WORKERS=8)
2. --config <path>     Explicit config file
3. ./conductor.toml    Project-level config
4. Built-in defaults

Example:
  conductor run --backend memory --manifests ./manifests
  conductor evaluate delete_volume --confidence 0.95 --health 90
  conductor validate -f proposal.json
  conductor vote -n team-a scale-down --agent reviewer-a --decision approve --score 90
"#)]
pub struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Output format (text, json); overrides `[output] format`
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the controller until interrupted
    Run(RunArgs),

    /// Evaluate one action against the policy (dry run)
    Evaluate(EvaluateArgs),

    /// Run admission on a JSON workload or proposal (dry run)
    Validate(ValidateArgs),

    /// Cast a vote on a proposal
    Vote(VoteArgs),

    /// Verify a licence token and report its claims
    #[command(name = "verify-license")]
    VerifyLicense(VerifyLicenseArgs),

    /// Show configuration sources, effective values and issues
    #[command(name = "show-config")]
    ShowConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Cluster backend; overrides `[controller] backend`
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Number of reconcile workers; overrides `[controller] workers`
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Directory of JSON manifests loaded into the memory backend at startup
    #[arg(long, value_name = "DIR")]
    pub manifests: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Action type, e.g. `delete_volume` or `get_metrics`
    pub action: String,

    /// Confidence in [0.0, 1.0]
    #[arg(long, default_value_t = 1.0)]
    pub confidence: f64,

    /// Cluster health in [0, 100]
    #[arg(long, default_value_t = 100)]
    pub health: u8,

    /// Policy overlay (base, strict, permissive)
    #[arg(long, default_value = "base")]
    pub mode: PolicyMode,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// JSON file holding one AgentWorkload or AgenticProposal
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: PathBuf,

    /// Admission operation to replay
    #[arg(long, value_enum, default_value_t = OperationArg::Create)]
    pub operation: OperationArg,
}

#[derive(Args, Debug, Clone)]
pub struct VoteArgs {
    /// Namespace of the proposal
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Proposal name
    pub proposal: String,

    /// Voting agent id
    #[arg(long)]
    pub agent: String,

    /// approve, conditional_approve or reject
    #[arg(long)]
    pub decision: VoteDecision,

    /// Score in [0, 100]
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub score: u8,

    /// Free-form feedback recorded with the vote
    #[arg(long, default_value = "")]
    pub feedback: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct VerifyLicenseArgs {
    /// Token to verify; defaults to the configured licence
    #[arg(long, conflicts_with = "token_file")]
    pub token: Option<String>,

    /// File holding the token
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Seats already in use, checked against the seat limit
    #[arg(long, default_value_t = 0)]
    pub seats_in_use: u32,
}
