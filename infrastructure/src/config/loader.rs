//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROJECT_CONFIG_FILE: &str = "conductor.toml";
pub const ENV_PREFIX: &str = "CONDUCTOR_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Where a configuration value may come from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment { prefix: String },
    Explicit { path: PathBuf, found: bool },
    Project { path: PathBuf, found: bool },
    Defaults,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory searched for `conductor.toml` (default: the working directory).
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CONDUCTOR_*` environment variables, `__` separating section and key
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./conductor.toml`
    /// 4. Default values
    pub fn load(&self, config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        self.figment(config_path)
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(&self, config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        let project = self.project_config_path();
        if project.exists() {
            figment = figment.merge(Toml::file(&project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(&self.env_prefix).split("__"))
    }

    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join(PROJECT_CONFIG_FILE)
    }

    /// The sources `load` consults, highest priority first.
    pub fn sources(&self, config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = vec![ConfigSource::Environment {
            prefix: self.env_prefix.clone(),
        }];
        if let Some(path) = config_path {
            sources.push(ConfigSource::Explicit {
                path: path.to_path_buf(),
                found: path.exists(),
            });
        }
        let project = self.project_config_path();
        sources.push(ConfigSource::Project {
            found: project.exists(),
            path: project,
        });
        sources.push(ConfigSource::Defaults);
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    fn loader(dir: &Path, prefix: &str) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix(prefix)
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader(dir.path(), "CONDUCTOR_TEST_NONE_").load(None).unwrap();
        assert_eq!(config, ConfigLoader::load_defaults());
    }

    #[test]
    fn test_explicit_file_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[controller]\nworkers = 2\nbackend = \"memory\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("override.toml");
        std::fs::write(&explicit, "[controller]\nworkers = 6\n").unwrap();

        let config = loader(dir.path(), "CONDUCTOR_TEST_FILES_")
            .load(Some(&explicit))
            .unwrap();
        assert_eq!(config.controller.workers, 6);
        assert_eq!(config.controller.backend, Backend::Memory);
        assert_eq!(config.controller.resync_interval_secs, 30);
    }

    #[test]
    fn test_environment_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[workflow]\nnamespace = \"from-file\"\n",
        )
        .unwrap();
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("CONDUCTOR_TEST_ENV_WORKFLOW__NAMESPACE", "from-env") };

        let config = loader(dir.path(), "CONDUCTOR_TEST_ENV_").load(None).unwrap();
        assert_eq!(config.workflow.namespace, "from-env");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = loader(dir.path(), "CONDUCTOR_TEST_MISSING_")
            .load(Some(&missing))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[controller]\nworkers = \"many\"\n",
        )
        .unwrap();
        let err = loader(dir.path(), "CONDUCTOR_TEST_BAD_").load(None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_sources_order() {
        let dir = tempfile::tempdir().unwrap();
        let sources =
            loader(dir.path(), ENV_PREFIX).sources(Some(Path::new("/etc/conductor.toml")));
        assert_eq!(sources.len(), 4);
        assert!(matches!(sources[0], ConfigSource::Environment { .. }));
        assert!(matches!(sources[3], ConfigSource::Defaults));
    }
}
