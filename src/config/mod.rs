//! Configuration management for `assets.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── assets     # [assets]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   └── error      # ConfigError
//! ├── util.rs        # Config discovery, path helpers
//! └── mod.rs         # AppConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section              | Purpose                                         |
//! |----------------------|-------------------------------------------------|
//! | `[assets]`           | Servlet parameters (cache, index, flags)        |
//! | `[assets.mappings]`  | Resource root -> URI prefix                     |
//! | `[assets.overrides]` | URL path -> filesystem path                     |
//! | `[assets.mime_types]`| Extension -> content type additions             |
//! | `[serve]`            | Development server (port, interface)            |

pub mod section;
pub mod types;
mod util;

pub use section::{AssetsConfig, ServeConfig};
pub use types::ConfigError;
pub use util::{find_config_file, resolve_relative};

use crate::{
    asset::MappingTable,
    cache::CacheSpec,
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assets.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Asset servlet settings
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl AppConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            bail!(
                "config file '{}' not found in the current directory or any parent",
                cli.config.display()
            );
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = config_path;
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.normalize_paths(&root);
        self.root = root;
        self.apply_command_options(cli);
    }

    /// Resolve the packaged source and override targets against `root`.
    pub fn normalize_paths(&mut self, root: &Path) {
        self.assets.source = resolve_relative(root, &self.assets.source);
        for target in self.assets.overrides.values_mut() {
            *target = resolve_relative(root, target);
        }
    }

    /// Apply command-specific CLI options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve { interface, port } = &cli.command {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Check everything the servlet would reject at initialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CacheSpec::parse(&self.assets.cache_spec)?;
        MappingTable::build(&self.assets.mappings)?;

        if self.assets.servlet_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[assets] servlet_name must not be empty".into(),
            ));
        }

        if self.assets.mappings.is_empty() && self.assets.overrides.is_empty() {
            log!("warning"; "no mappings or overrides configured, every request will 404");
        }
        if !self.assets.mappings.is_empty() && !self.assets.source.is_dir() {
            log!(
                "warning";
                "packaged source '{}' is not a directory",
                self.assets.source.display()
            );
        }

        Ok(())
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }
}

/// Parse a config snippet, asserting that every key is recognized.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AppConfig {
    let (parsed, ignored) = AppConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_empty() {
        let config = AppConfig::from_str("").unwrap();
        assert!(config.assets.mappings.is_empty());
        assert_eq!(config.serve.port, 5277);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let err = AppConfig::from_str("[assets\nmappings = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) = AppConfig::parse_with_ignored(
            "[assets]\nservlet_name = \"x\"\nbogus = 1\n[other]\nkey = true",
        )
        .unwrap();
        assert_eq!(config.assets.servlet_name, "x");
        assert_eq!(ignored, ["assets.bogus", "other"]);
    }

    #[test]
    fn test_normalize_paths() {
        let mut config = test_parse_config(
            r#"
[assets]
source = "dist"

[assets.overrides]
"/static/a.css" = "dev/a.css"
"/static/b.css" = "/abs/b.css"
"#,
        );
        config.normalize_paths(Path::new("/srv/site"));

        assert_eq!(config.assets.source, PathBuf::from("/srv/site/dist"));
        assert_eq!(
            config.assets.overrides["/static/a.css"],
            PathBuf::from("/srv/site/dev/a.css")
        );
        assert_eq!(
            config.assets.overrides["/static/b.css"],
            PathBuf::from("/abs/b.css")
        );
    }

    #[test]
    fn test_validate_rejects_bad_cache_spec() {
        let config = test_parse_config("[assets]\ncache_spec = \"maximumSize=ten\"");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CacheSpec { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_mappings() {
        let config = test_parse_config(
            "[assets.mappings]\n\"assets\" = \"/a\"\n\"/assets/\" = \"/b\"",
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateMapping { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_servlet_name() {
        let config = test_parse_config("[assets]\nservlet_name = \" \"");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let dir = TempDir::new().unwrap();
        let mut config = test_parse_config("[assets.mappings]\n\"assets\" = \"/static\"");
        config.normalize_paths(dir.path());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::from_path(&dir.path().join("assets.toml")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.toml");
        fs::write(&path, "[serve]\nport = 9000\n").unwrap();

        let config = AppConfig::from_path(&path).unwrap();
        assert_eq!(config.serve.port, 9000);
    }
}
