//! Licence configuration from TOML (`[license]` section)

use conductor_domain::{ConfigIssue, LicenseError, LicenseVerifier};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLicenseConfig {
    /// Inline licence token
    pub token: Option<String>,
    /// File holding the token, re-read on every reconcile. Wins over `token`.
    pub token_file: Option<PathBuf>,
    /// Base64 PKIX Ed25519 public key; defaults to the key built into the binary
    pub public_key: Option<String>,
}

impl FileLicenseConfig {
    pub fn verifier(&self) -> Result<LicenseVerifier, LicenseError> {
        match &self.public_key {
            Some(key) => LicenseVerifier::from_pkix_base64(key),
            None => LicenseVerifier::embedded(),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let inline = self.token.as_deref().is_some_and(|t| !t.trim().is_empty());
        match (&self.token_file, inline) {
            (None, false) => issues.push(ConfigIssue::warning(
                "license.token",
                "no licence configured; every workload will be marked Failed",
            )),
            (Some(_), true) => issues.push(ConfigIssue::warning(
                "license.token",
                "both token and token_file are set; token_file is used",
            )),
            (Some(path), false) if !path.exists() => issues.push(ConfigIssue::warning(
                "license.token_file",
                format!("{} does not exist yet", path.display()),
            )),
            _ => {}
        }
        if let Err(e) = self.verifier() {
            issues.push(ConfigIssue::error("license.public_key", e.to_string()));
        }
        issues
    }
}
