//! Configuration loading for agentic-conductor
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CONDUCTOR_*` environment variables (`CONDUCTOR_CONTROLLER__WORKERS=8`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./conductor.toml`
//! 4. Default values

mod file_config;
mod loader;

pub use file_config::{
    Backend, FileAdmissionConfig, FileConfig, FileControllerConfig, FileKubernetesConfig,
    FileLicenseConfig, FileLoggingConfig, FileOutputConfig, FileWorkflowConfig,
    IN_CLUSTER_API_SERVER, SERVICE_ACCOUNT_DIR,
};
pub use loader::{ConfigError, ConfigLoader, ConfigSource, ENV_PREFIX, PROJECT_CONFIG_FILE};
