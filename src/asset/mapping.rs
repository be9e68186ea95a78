//! Mapping and override tables.
//!
//! Both tables are built once from configuration and are read-only
//! afterwards, so they are shared between request threads without locking.
//!
//! ```text
//! mapping:   "assets/" -> "/static/"     /static/js/app.js  -> assets/js/app.js
//! override:  "/static/" -> "./web"       /static/js/app.js  -> ./web/js/app.js
//! ```

use crate::config::ConfigError;
use crate::utils::path::{has_parent_component, trim_slashes};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

// ============================================================================
// Mapping
// ============================================================================

/// A packaged resource root served under a URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    resource_root: String,
    uri_prefix: String,
}

impl Mapping {
    /// Normalized resource root, e.g. `assets/` (`/` for the package root).
    pub fn resource_root(&self) -> &str {
        &self.resource_root
    }

    /// Normalized URI prefix, e.g. `/static/`.
    pub fn uri_prefix(&self) -> &str {
        &self.uri_prefix
    }

    /// Sub-path of `path` below this mapping's prefix, slashes trimmed.
    ///
    /// The prefix without its trailing slash (`/static`) also matches and
    /// yields an empty sub-path, i.e. the root directory of the mapping.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if let Some(rest) = path.strip_prefix(self.uri_prefix.as_str()) {
            return Some(trim_slashes(rest));
        }
        let bare = self.uri_prefix.trim_end_matches('/');
        (!bare.is_empty() && path == bare).then_some("")
    }

    /// Absolute lookup path in the packaged source for a sub-path.
    pub fn lookup_path(&self, sub_path: &str) -> String {
        let root = trim_slashes(&self.resource_root);
        match (root.is_empty(), sub_path.is_empty()) {
            (true, _) => sub_path.to_string(),
            (false, true) => root.to_string(),
            (false, false) => format!("{root}/{sub_path}"),
        }
    }

    /// Servlet-style URL pattern covering this mapping, e.g. `/static/*`.
    pub fn url_pattern(&self) -> String {
        format!("{}*", self.uri_prefix)
    }
}

/// Normalize a resource root: no leading slash, one trailing slash.
fn normalize_resource_root(raw: &str) -> String {
    let trimmed = trim_slashes(raw);
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Normalize a URI prefix: one leading slash, one trailing slash.
fn normalize_uri_prefix(raw: &str) -> String {
    let trimmed = trim_slashes(raw);
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

// ============================================================================
// MappingTable
// ============================================================================

/// Ordered, normalized set of mappings with unique resource roots.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    mappings: Vec<Mapping>,
}

impl MappingTable {
    /// Build the table from raw `(resource root, uri prefix)` pairs.
    ///
    /// Fails with [`ConfigError::DuplicateMapping`] if two entries normalize
    /// to the same resource root. Nothing else is validated here: a root that
    /// does not exist simply never resolves.
    pub fn build<I, K, V>(raw: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = FxHashSet::default();
        let mut mappings = Vec::new();

        for (root, prefix) in raw {
            let resource_root = normalize_resource_root(root.as_ref());
            if !seen.insert(resource_root.clone()) {
                return Err(ConfigError::DuplicateMapping { resource_root });
            }
            mappings.push(Mapping {
                resource_root,
                uri_prefix: normalize_uri_prefix(prefix.as_ref()),
            });
        }

        Ok(Self { mappings })
    }

    /// Iterate mappings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Mappings whose prefix covers `path`, with the stripped sub-path.
    pub fn matching<'a, 'p>(
        &'a self,
        path: &'p str,
    ) -> impl Iterator<Item = (&'a Mapping, &'p str)> {
        self.mappings
            .iter()
            .filter_map(move |m| m.strip(path).map(|sub| (m, sub)))
    }

    /// URL patterns the adapter registers, one per mapping.
    pub fn url_patterns(&self) -> Vec<String> {
        self.mappings.iter().map(Mapping::url_pattern).collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

// ============================================================================
// Overrides
// ============================================================================

/// Development redirect of a URI path (or subtree) to the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    match_path: String,
    target: PathBuf,
}

impl Override {
    pub fn new(match_path: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            match_path: match_path.into(),
            target: target.into(),
        }
    }

    pub fn match_path(&self) -> &str {
        &self.match_path
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Candidate filesystem location for `path`, if this override covers it.
    ///
    /// An exact match yields the target itself; a subtree match joins the
    /// remainder of the path onto the target. Remainders that climb out of
    /// the target with `..` never match.
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        if path == self.match_path {
            return Some(self.target.clone());
        }
        let rest = path.strip_prefix(self.match_path.as_str())?;
        let rest = rest.trim_start_matches('/');
        if has_parent_component(rest) {
            return None;
        }
        Some(self.target.join(rest))
    }
}

/// Ordered override list; first match wins.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    overrides: Vec<Override>,
}

impl OverrideTable {
    pub fn new<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PathBuf>,
    {
        Self {
            overrides: raw.into_iter().map(|(k, v)| Override::new(k, v)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Override> {
        self.overrides.iter()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
