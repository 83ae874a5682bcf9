//! Licence issuer
//!
//! Signs a licence token with a PKCS#8 PEM Ed25519 key and prints it on
//! stdout. Any validation failure exits non-zero with the reason on stderr.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use conductor_domain::license::{IssueRequest, issue};
use conductor_infrastructure::load_signing_key;
use conductor_presentation::LicenseCli;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = LicenseCli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let key = load_signing_key(&cli.key)?;
    let request = IssueRequest {
        licensee: cli.licensee,
        customer_id: cli.customer_id,
        tier: cli.tier,
        seats: cli.seats,
        days: cli.days,
        features: cli.features,
    };
    let token = issue(&request, &key, Utc::now()).context("cannot issue licence")?;
    info!(licensee = %request.licensee, tier = %request.tier, "Licence issued");

    println!("{}", token);
    Ok(())
}
