//! Licence token sources backed by configuration.

use conductor_application::ports::license_source::LicenseSource;
use std::path::PathBuf;
use tracing::warn;

/// Token from `[license]`: the file when one is configured, else the inline value.
///
/// The file is read on every call so a rotated token is picked up on the
/// next reconcile.
pub struct ConfiguredLicense {
    inline: Option<String>,
    file: Option<PathBuf>,
}

impl ConfiguredLicense {
    pub fn new(inline: Option<String>, file: Option<PathBuf>) -> Self {
        Self { inline, file }
    }
}

impl LicenseSource for ConfiguredLicense {
    fn token(&self) -> Option<String> {
        let token = match &self.file {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(content) => Some(content),
                Err(e) => {
                    warn!("Could not read licence file {}: {}", path.display(), e);
                    None
                }
            },
            None => self.inline.clone(),
        };
        token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_token() {
        let source = ConfiguredLicense::new(Some(" a.b.c \n".to_string()), None);
        assert_eq!(source.token().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_file_is_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.jwt");
        std::fs::write(&path, "first.token.sig\n").unwrap();
        let source =
            ConfiguredLicense::new(Some("inline.token.sig".to_string()), Some(path.clone()));
        assert_eq!(source.token().as_deref(), Some("first.token.sig"));

        std::fs::write(&path, "second.token.sig\n").unwrap();
        assert_eq!(source.token().as_deref(), Some("second.token.sig"));
    }

    #[test]
    fn test_missing_file_means_no_token() {
        let source = ConfiguredLicense::new(None, Some(PathBuf::from("/nonexistent/license.jwt")));
        assert!(source.token().is_none());
    }

    #[test]
    fn test_blank_inline_is_none() {
        assert!(ConfiguredLicense::new(Some("  ".to_string()), None).token().is_none());
    }
}
