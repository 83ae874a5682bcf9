//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit_logger;
pub mod clock;
pub mod cluster;
pub mod endpoint_probe;
pub mod license_source;
pub mod plan_executor;
