//! Compact `header.claims.signature` token codec.
//!
//! Each segment is base64url without padding. The signature is Ed25519
//! over the ASCII bytes of `header + "." + claims`.

use super::claims::LicenseClaims;
use super::error::LicenseError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "EdDSA".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// The three raw segments of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    pub signature: &'a str,
}

impl<'a> TokenParts<'a> {
    /// Split on `.`; anything other than exactly three parts is malformed.
    pub fn split(token: &'a str) -> Result<Self, LicenseError> {
        let parts: Vec<&str> = token.trim().split('.').collect();
        match parts.as_slice() {
            &[header, claims, signature] => Ok(Self {
                header,
                claims,
                signature,
            }),
            _ => Err(LicenseError::MalformedToken(format!(
                "expected 3 segments, found {}",
                parts.len()
            ))),
        }
    }

    /// The bytes covered by the signature.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.claims)
    }

    pub fn decode_signature(&self) -> Result<Signature, LicenseError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.signature)
            .map_err(|e| LicenseError::MalformedToken(format!("signature segment: {}", e)))?;
        Signature::from_slice(&bytes)
            .map_err(|e| LicenseError::MalformedToken(format!("signature length: {}", e)))
    }

    pub fn decode_claims(&self) -> Result<LicenseClaims, LicenseError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.claims)
            .map_err(|e| LicenseError::BadClaims(format!("claims segment: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| LicenseError::BadClaims(e.to_string()))
    }
}

/// Sign `claims` into a compact token.
pub fn encode_token(claims: &LicenseClaims, key: &SigningKey) -> Result<String, LicenseError> {
    let header = serde_json::to_vec(&TokenHeader::default())
        .map_err(|e| LicenseError::BadClaims(e.to_string()))?;
    let payload =
        serde_json::to_vec(claims).map_err(|e| LicenseError::BadClaims(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}
