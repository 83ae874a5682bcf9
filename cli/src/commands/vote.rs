//! `conductor vote`

use super::audit_logger;
use anyhow::{Context, Result, bail};
use conductor_application::{CastVoteInput, CastVoteUseCase};
use conductor_domain::Vote;
use conductor_infrastructure::{Backend, FileConfig, KubernetesCluster};
use conductor_presentation::{OutputFormatter, VoteArgs};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    args: VoteArgs,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
) -> Result<ExitCode> {
    if config.controller.backend == Backend::Memory {
        bail!("vote needs the kubernetes backend; memory state only exists inside `conductor run`");
    }
    let cluster = KubernetesCluster::from_config(&config.kubernetes)
        .context("cannot connect to the API server")?;
    let use_case = CastVoteUseCase::new(Arc::new(cluster)).with_audit_logger(audit_logger(config));

    let vote = Vote::new(&args.agent, args.decision, args.score).with_feedback(&args.feedback);
    let input = CastVoteInput::new(&args.namespace, &args.proposal, vote);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let receipt = use_case.execute(input, &cancel).await.with_context(|| {
        format!(
            "vote by {} on {}/{} failed",
            args.agent, args.namespace, args.proposal
        )
    })?;
    println!(
        "{}",
        formatter.vote_receipt(&args.proposal, &args.agent, &receipt)
    );
    Ok(ExitCode::SUCCESS)
}
