//! Infrastructure layer for agentic-conductor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod cluster;
pub mod config;
pub mod executor;
pub mod license;
pub mod logging;
pub mod probe;

#[cfg(test)]
mod test_http;

// Re-export commonly used types
pub use cluster::{InMemoryCluster, KubernetesCluster};
pub use config::{Backend, ConfigError, ConfigLoader, FileConfig};
pub use executor::WebhookPlanExecutor;
pub use license::{ConfiguredLicense, KeyLoadError, load_signing_key};
pub use logging::JsonlAuditLogger;
pub use probe::HttpEndpointProbe;
