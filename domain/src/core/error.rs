//! Domain error types
//!
//! Every failure in the control plane, whatever layer raises it, is
//! classified into one [`ErrorKind`]. The kind decides how the reconciler
//! reacts (status condition, requeue cadence) and doubles as the reason
//! string written into `Degraded` conditions.

use thiserror::Error;

/// Classification shared by all layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailed,
    MalformedToken,
    BadSignature,
    Expired,
    SeatLimit,
    AlreadyExists,
    NotFound,
    ConflictRetry,
    Transient,
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::MalformedToken => "MalformedToken",
            ErrorKind::BadSignature => "BadSignature",
            ErrorKind::Expired => "Expired",
            ErrorKind::SeatLimit => "SeatLimit",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ConflictRetry => "ConflictRetry",
            ErrorKind::Transient => "Transient",
            ErrorKind::Fatal => "Fatal",
        }
    }

    /// Licence failures that park a workload until its spec changes.
    pub fn is_license_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedToken
                | ErrorKind::BadSignature
                | ErrorKind::Expired
                | ErrorKind::SeatLimit
        )
    }

    /// Whether retrying without a spec change can ever succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConflictRetry
                | ErrorKind::Transient
                | ErrorKind::NotFound
                | ErrorKind::SeatLimit
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single rejected field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors found while validating one resource.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("validation failed: {}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailed
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
