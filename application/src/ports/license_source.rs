//! Licence token source port.
//!
//! The reconciler asks for the token on every pass, so a rotated token file
//! takes effect without a restart.

pub trait LicenseSource: Send + Sync {
    /// The current token, or `None` when no licence is installed.
    fn token(&self) -> Option<String>;
}

/// A token fixed at construction.
pub struct StaticLicense(Option<String>);

impl StaticLicense {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }
}

impl LicenseSource for StaticLicense {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
