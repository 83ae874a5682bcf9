//! Licence verification.
//!
//! Verification is a pure function of the token, the public key and the
//! supplied clock reading, so the same inputs always give the same answer.

use super::claims::LicenseClaims;
use super::error::LicenseError;
use super::token::TokenParts;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Verifier, VerifyingKey};

/// DER prefix of an Ed25519 `SubjectPublicKeyInfo` (RFC 8410).
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const SPKI_LEN: usize = 44;

/// Public key baked in at build time, base64 PKIX DER.
///
/// Override with `CONDUCTOR_LICENSE_PUBLIC_KEY` when building.
pub const EMBEDDED_PUBLIC_KEY: &str = match option_env!("CONDUCTOR_LICENSE_PUBLIC_KEY") {
    Some(key) => key,
    None => "MCowBQYDK2VwAyEAjct6TTlkXX+evtA6seqJ0dX8BbqdZ1XNiFji+U0jYf8=",
};

/// Licences closer than this to expiry produce a warning.
pub const EXPIRY_WARNING_WINDOW_DAYS: i64 = 30;

/// Non-fatal notice that a licence expires soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryWarning {
    pub expires_at: DateTime<Utc>,
    pub days_left: i64,
}

impl std::fmt::Display for ExpiryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "licence expires in {} day(s) at {}",
            self.days_left,
            self.expires_at.to_rfc3339()
        )
    }
}

/// A licence that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLicense {
    pub claims: LicenseClaims,
    pub warning: Option<ExpiryWarning>,
}

#[derive(Debug, Clone)]
pub struct LicenseVerifier {
    key: VerifyingKey,
}

impl LicenseVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// The verifier for the key embedded in this build.
    pub fn embedded() -> Result<Self, LicenseError> {
        Self::from_pkix_base64(EMBEDDED_PUBLIC_KEY)
    }

    /// Accept a 44-byte PKIX blob; the trailing 32 bytes are the raw key.
    pub fn from_pkix_der(der: &[u8]) -> Result<Self, LicenseError> {
        if der.len() != SPKI_LEN {
            return Err(LicenseError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                SPKI_LEN,
                der.len()
            )));
        }
        if der[..ED25519_SPKI_PREFIX.len()] != ED25519_SPKI_PREFIX {
            return Err(LicenseError::InvalidPublicKey(
                "not an Ed25519 SubjectPublicKeyInfo".to_string(),
            ));
        }
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&der[SPKI_LEN - 32..]);
        let key = VerifyingKey::from_bytes(&raw)
            .map_err(|e| LicenseError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::new(key))
    }

    pub fn from_pkix_base64(encoded: &str) -> Result<Self, LicenseError> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| LicenseError::InvalidPublicKey(e.to_string()))?;
        Self::from_pkix_der(&der)
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    /// Verify signature, claims and expiry at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedLicense, LicenseError> {
        let parts = TokenParts::split(token)?;

        let signature = parts.decode_signature()?;
        self.key
            .verify(parts.signing_input().as_bytes(), &signature)
            .map_err(|_| LicenseError::BadSignature)?;

        let claims = parts.decode_claims()?;

        let now_secs = now.timestamp();
        if now_secs > claims.expires_at {
            return Err(LicenseError::Expired {
                expires_at: claims.expires_at_utc(),
            });
        }

        let remaining = claims.expires_at - now_secs;
        let warning = (remaining < Duration::days(EXPIRY_WARNING_WINDOW_DAYS).num_seconds()).then(
            || ExpiryWarning {
                expires_at: claims.expires_at_utc(),
                days_left: remaining / 86_400,
            },
        );

        Ok(VerifiedLicense { claims, warning })
    }

    /// [`verify`](Self::verify) plus the seat-count check.
    pub fn enforce(
        &self,
        token: &str,
        now: DateTime<Utc>,
        current_seats: u32,
    ) -> Result<VerifiedLicense, LicenseError> {
        let license = self.verify(token, now)?;
        let max = license.claims.max_seats;
        if max > 0 && current_seats >= max {
            return Err(LicenseError::SeatLimit {
                current: current_seats,
                max,
            });
        }
        Ok(license)
    }
}
