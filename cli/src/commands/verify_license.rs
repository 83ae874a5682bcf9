//! `conductor verify-license`

use anyhow::{Context, Result};
use chrono::Utc;
use conductor_application::LicenseSource;
use conductor_domain::LicenseError;
use conductor_infrastructure::{ConfiguredLicense, FileConfig};
use conductor_presentation::{OutputFormatter, VerifyLicenseArgs};
use std::process::ExitCode;

/// Token from the flags, falling back to the configured licence.
fn token(args: &VerifyLicenseArgs, config: &FileConfig) -> Result<Option<String>> {
    if let Some(token) = &args.token {
        return Ok(Some(token.trim().to_string()));
    }
    if let Some(path) = &args.token_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        return Ok(Some(text.trim().to_string()).filter(|t| !t.is_empty()));
    }
    let configured = ConfiguredLicense::new(
        config.license.token.clone(),
        config.license.token_file.clone(),
    );
    Ok(configured.token())
}

pub fn execute(
    args: VerifyLicenseArgs,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
) -> Result<ExitCode> {
    let verifier = config
        .license
        .verifier()
        .context("license.public_key is not usable")?;
    let token = token(&args, config)?.ok_or(LicenseError::Missing)?;

    let license = verifier
        .enforce(&token, Utc::now(), args.seats_in_use)
        .map_err(|e| {
            let kind = e.kind();
            anyhow::Error::new(e).context(format!("licence rejected ({})", kind))
        })?;
    println!("{}", formatter.license(&license, args.seats_in_use));
    Ok(ExitCode::SUCCESS)
}
