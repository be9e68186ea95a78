//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration-related errors.
///
/// All of these are fatal at startup: an asset servlet is never built from a
/// configuration that produced one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    /// Two mappings normalize to the same resource root.
    #[error("mappings contain multiple entries for resource root `{resource_root}`")]
    DuplicateMapping { resource_root: String },

    /// The cache sizing string could not be parsed.
    #[error("invalid cache spec `{spec}`: {reason}")]
    CacheSpec { spec: String, reason: String },

    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn cache_spec(spec: &str, reason: impl Into<String>) -> Self {
        Self::CacheSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("assets.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("assets.toml"));

        let dup = ConfigError::DuplicateMapping {
            resource_root: "assets/".to_string(),
        };
        assert!(format!("{dup}").contains("`assets/`"));

        let spec = ConfigError::cache_spec("maximumSize=x", "not a number");
        let display = format!("{spec}");
        assert!(display.contains("maximumSize=x"));
        assert!(display.contains("not a number"));
    }
}
