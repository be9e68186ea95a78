//! `[assets]` section configuration.
//!
//! Initialization parameters of the asset servlet.
//!
//! # Example
//!
//! ```toml
//! [assets]
//! source = "public"                          # Directory holding packaged resources
//! cache_spec = "maximumSize=100"             # Resolution cache sizing
//! index_file = "index.html"                  # "" disables index lookup
//! servlet_name = "assets"
//!
//! [assets.mappings]
//! "assets/" = "/static/"                     # resource root -> URI prefix
//! "vendor" = "/lib"
//!
//! [assets.overrides]
//! "/static/site.css" = "dev/site.css"        # URL path -> filesystem path
//! "/static/img/" = "/home/me/img"
//!
//! [assets.mime_types]
//! webmanifest = "application/manifest+json"
//! ```
//!
//! Mappings and overrides keep the order they are written in; the first
//! matching entry wins. Relative override targets are resolved against the
//! directory holding the config file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::DEFAULT_CACHE_SPEC;

/// Asset servlet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Resource root -> URI prefix.
    pub mappings: IndexMap<String, String>,

    /// URL path (exact or subtree) -> filesystem path.
    pub overrides: IndexMap<String, PathBuf>,

    /// Extension -> content type additions, registered with the host.
    pub mime_types: IndexMap<String, String>,

    pub cache_spec: String,

    /// Passed through to the host; no header is emitted when unset.
    pub cache_control_header: Option<String>,

    pub accept_ranges: bool,
    pub etags: bool,
    pub gzip: bool,
    pub other_gzip_file_extensions: Vec<String>,

    /// Document served for directory requests. `None` or `""` disables it.
    pub index_file: Option<String>,

    pub servlet_name: String,

    /// Directory holding packaged resources.
    pub source: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            mappings: IndexMap::new(),
            overrides: IndexMap::new(),
            mime_types: IndexMap::new(),
            cache_spec: DEFAULT_CACHE_SPEC.to_string(),
            cache_control_header: None,
            accept_ranges: true,
            etags: true,
            gzip: false,
            other_gzip_file_extensions: Vec::new(),
            index_file: Some("index.html".to_string()),
            servlet_name: "assets".to_string(),
            source: PathBuf::from("public"),
        }
    }
}

impl AssetsConfig {
    /// Index file with the empty string treated as disabled.
    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref().filter(|s| !s.is_empty())
    }
}
