//! Licence issuance for the `conductor-license` utility.

use super::claims::{LicenseClaims, Tier};
use super::error::LicenseError;
use super::token::encode_token;
use crate::core::error::{FieldError, ValidationError};
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;

/// Upper bound on licence lifetime accepted by the issuer.
pub const MAX_LICENSE_DAYS: i64 = 3650;

/// Flags collected by the issuer before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub licensee: String,
    pub customer_id: Option<String>,
    pub tier: String,
    pub seats: i64,
    pub days: i64,
    pub features: Vec<String>,
}

impl IssueRequest {
    /// Check every flag and build the claims for `now`.
    pub fn to_claims(&self, now: DateTime<Utc>) -> Result<LicenseClaims, ValidationError> {
        let mut errors = ValidationError::default();

        let licensee = self.licensee.trim();
        if licensee.is_empty() {
            errors.push(FieldError::new("licensee", "must not be empty"));
        }
        let tier = match self.tier.parse::<Tier>() {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(FieldError::new("tier", e));
                None
            }
        };
        let seats = match u32::try_from(self.seats) {
            Ok(s) => Some(s),
            Err(_) => {
                errors.push(FieldError::new(
                    "seats",
                    format!("must be between 0 and {}, got {}", u32::MAX, self.seats),
                ));
                None
            }
        };
        if self.days <= 0 || self.days > MAX_LICENSE_DAYS {
            errors.push(FieldError::new(
                "days",
                format!("must be between 1 and {}, got {}", MAX_LICENSE_DAYS, self.days),
            ));
        }
        if self.features.iter().any(|f| f.trim().is_empty()) {
            errors.push(FieldError::new("feature", "must not be empty"));
        }

        let (tier, max_seats) = match (tier, seats) {
            (Some(tier), Some(seats)) if errors.is_empty() => (tier, seats),
            _ => return Err(errors),
        };

        let customer_id = self
            .customer_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| derive_customer_id(licensee));

        Ok(LicenseClaims {
            customer_id,
            licensee: licensee.to_string(),
            tier,
            max_seats,
            expires_at: (now + Duration::days(self.days)).timestamp(),
            features: self.features.clone(),
        })
    }
}

/// Sign claims derived from `request`.
pub fn issue(
    request: &IssueRequest,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<String, IssueError> {
    let claims = request.to_claims(now)?;
    Ok(encode_token(&claims, key)?)
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] LicenseError),
}

/// Slug of the licensee name, used when no customer id is given.
fn derive_customer_id(licensee: &str) -> String {
    let slug: String = licensee
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    slug.split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
