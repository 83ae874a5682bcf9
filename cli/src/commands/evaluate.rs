//! `conductor evaluate`: policy dry run

use anyhow::Result;
use conductor_domain::{PolicyInput, evaluate};
use conductor_presentation::{EvaluateArgs, OutputFormatter};
use std::process::ExitCode;

/// Prints the decision; exits 1 when the action is denied.
pub fn execute(args: EvaluateArgs, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let input = PolicyInput::new(args.action, args.confidence, args.health);
    let decision = evaluate(&input, args.mode);
    println!("{}", formatter.policy_decision(&decision));
    Ok(if decision.allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
