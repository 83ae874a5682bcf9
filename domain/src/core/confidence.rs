//! Confidence values in `[0.0, 1.0]`, carried on the wire as two-decimal strings.

use super::error::FieldError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A confidence score in `[0.0, 1.0]`.
///
/// Serializes as a string with exactly two decimals (`"0.95"`) and accepts
/// either a string or a JSON number when deserializing.
///
/// ```
/// use conductor_domain::Confidence;
///
/// let c = Confidence::new(0.876).unwrap();
/// assert_eq!(c.to_string(), "0.88");
/// assert_eq!("0.88".parse::<Confidence>().unwrap().value(), 0.88);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, FieldError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(FieldError::new(
                "confidence",
                format!("must be within [0.0, 1.0], got {}", value),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn rounded(&self) -> f64 {
        round2(self.0)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", round2(self.0))
    }
}

impl FromStr for Confidence {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| FieldError::new("confidence", format!("not a number: '{}'", s)))?;
        Confidence::new(value)
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse(),
            Raw::Number(n) => Confidence::new(n),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
