//! Licence verification errors

use crate::core::error::ErrorKind;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LicenseError {
    #[error("No licence token configured")]
    Missing,

    #[error("Malformed licence token: {0}")]
    MalformedToken(String),

    #[error("Licence signature does not verify")]
    BadSignature,

    #[error("Licence claims could not be decoded: {0}")]
    BadClaims(String),

    #[error("Licence expired at {}", expires_at.to_rfc3339())]
    Expired { expires_at: DateTime<Utc> },

    #[error("Licence seat limit reached: {current} of {max} seats in use")]
    SeatLimit { current: u32, max: u32 },

    #[error("Invalid licence public key: {0}")]
    InvalidPublicKey(String),
}

impl LicenseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LicenseError::Missing
            | LicenseError::MalformedToken(_)
            | LicenseError::BadClaims(_) => ErrorKind::MalformedToken,
            LicenseError::BadSignature => ErrorKind::BadSignature,
            LicenseError::Expired { .. } => ErrorKind::Expired,
            LicenseError::SeatLimit { .. } => ErrorKind::SeatLimit,
            LicenseError::InvalidPublicKey(_) => ErrorKind::Fatal,
        }
    }
}
