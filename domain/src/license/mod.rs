//! Licence tokens: claims, compact codec, verification and issuance.
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(ed25519(header.claims))
//! ```

pub mod claims;
pub mod error;
pub mod issuer;
pub mod token;
pub mod verifier;

pub use claims::{LicenseClaims, Tier};
pub use error::LicenseError;
pub use issuer::{IssueError, IssueRequest, issue};
pub use token::{TokenHeader, TokenParts, encode_token};
pub use verifier::{EMBEDDED_PUBLIC_KEY, ExpiryWarning, LicenseVerifier, VerifiedLicense};
