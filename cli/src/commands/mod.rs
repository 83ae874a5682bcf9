//! Subcommand handlers
//!
//! Each handler returns the process exit code; errors bubble up to `main`
//! and are printed by `anyhow`.

pub mod evaluate;
pub mod run;
pub mod show_config;
pub mod validate;
pub mod verify_license;
pub mod vote;

use conductor_application::{AuditLogger, NoAuditLogger};
use conductor_infrastructure::{FileConfig, JsonlAuditLogger};
use std::sync::Arc;
use tracing::warn;

/// The configured audit trail, or a no-op logger.
pub(crate) fn audit_logger(config: &FileConfig) -> Arc<dyn AuditLogger> {
    let Some(path) = &config.logging.audit_file else {
        return Arc::new(NoAuditLogger);
    };
    match JsonlAuditLogger::open(path) {
        Some(logger) => Arc::new(logger),
        None => {
            warn!(path = %path.display(), "Audit log unavailable; decisions will not be recorded");
            Arc::new(NoAuditLogger)
        }
    }
}
