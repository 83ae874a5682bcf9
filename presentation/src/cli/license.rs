//! CLI definition for the licence issuer

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for conductor-license
#[derive(Parser, Debug)]
#[command(name = "conductor-license")]
#[command(author, version, about = "Issue signed conductor licence tokens")]
#[command(long_about = r#"
Signs a licence token with an Ed25519 private key (PKCS#8 PEM) and prints
it on stdout. The token is accepted by any conductor built with the
matching public key.

Example:
  conductor-license --licensee "Acme Corp" --tier pro --seats 10 --days 365 --key private.pem
"#)]
pub struct LicenseCli {
    /// Name of the licensed organisation
    #[arg(long)]
    pub licensee: String,

    /// Customer id; derived from the licensee when omitted
    #[arg(long)]
    pub customer_id: Option<String>,

    /// trial, basic, pro or enterprise
    #[arg(long)]
    pub tier: String,

    /// Maximum concurrent workloads (0 = unlimited)
    #[arg(long, allow_negative_numbers = true)]
    pub seats: i64,

    /// Validity in days from now
    #[arg(long, allow_negative_numbers = true)]
    pub days: i64,

    /// PKCS#8 PEM private key
    #[arg(long, value_name = "PATH")]
    pub key: PathBuf,

    /// Feature flag granted by the licence (repeatable)
    #[arg(long = "feature", value_name = "NAME")]
    pub features: Vec<String>,

    /// Verbosity level (-v = info, -vv = debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
