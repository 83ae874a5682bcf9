//! Application-level configuration.
//!
//! - [`ControllerParams`]: work queue and reconcile cadence
//! - [`BackoffPolicy`]: capped exponential backoff for failing keys

pub mod backoff;
pub mod controller_params;

pub use backoff::BackoffPolicy;
pub use controller_params::ControllerParams;
