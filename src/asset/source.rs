//! Packaged resource sources.
//!
//! A packaged source is the read-only resource set assets are served from in
//! production: a directory shipped next to the binary, or a set of files
//! compiled into it. Lookups are keyed by `/`-separated paths relative to the
//! source root with no leading slash (`assets/js/app.js`).

use crate::utils::path::{has_parent_component, trim_slashes};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Result of a successful packaged lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packaged {
    /// A regular resource with its content and reported modification time.
    File {
        bytes: Vec<u8>,
        modified: Option<SystemTime>,
    },
    /// The path names a directory of resources.
    Directory,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// No resource exists at this path. Expected during resolution.
    #[error("packaged resource `{0}` not found")]
    NotFound(String),

    /// The resource exists but could not be read.
    #[error("failed to read packaged resource `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Read-only resource loader keyed by absolute resource path.
pub trait PackagedSource: Send + Sync {
    fn load(&self, path: &str) -> Result<Packaged, SourceError>;

    /// Human-readable location of a resource, for logs.
    fn describe(&self, path: &str) -> String {
        path.to_string()
    }
}

// ============================================================================
// DirSource
// ============================================================================

/// Packaged resources laid out in a directory tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(trim_slashes(path))
    }
}

impl PackagedSource for DirSource {
    fn load(&self, path: &str) -> Result<Packaged, SourceError> {
        if has_parent_component(path) {
            return Err(SourceError::NotFound(path.to_string()));
        }

        let full = self.full_path(path);
        let io_err = |source| SourceError::Io {
            path: path.to_string(),
            source,
        };

        let meta = match full.metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.to_string()));
            }
            Err(e) => return Err(io_err(e)),
        };

        if meta.is_dir() {
            return Ok(Packaged::Directory);
        }

        let bytes = std::fs::read(&full).map_err(io_err)?;
        Ok(Packaged::File {
            bytes,
            modified: meta.modified().ok(),
        })
    }

    fn describe(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}

// ============================================================================
// MemorySource
// ============================================================================

#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Vec<u8>,
    modified: Option<SystemTime>,
}

/// Packaged resources held in memory, e.g. files embedded at build time.
///
/// Directories are implicit: any path with entries below it is a directory.
///
/// ```ignore
/// let source = MemorySource::new()
///     .with_file("assets/app.js", include_bytes!("app.js"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<String, MemoryEntry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(
        mut self,
        path: &str,
        bytes: impl Into<Vec<u8>>,
        modified: Option<SystemTime>,
    ) -> Self {
        self.insert(path, bytes, modified);
        self
    }

    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>, modified: Option<SystemTime>) {
        self.entries.insert(
            trim_slashes(path).to_string(),
            MemoryEntry {
                bytes: bytes.into(),
                modified,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_directory(&self, path: &str) -> bool {
        if path.is_empty() {
            return !self.entries.is_empty();
        }
        let prefix = format!("{path}/");
        self.entries
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }
}

impl PackagedSource for MemorySource {
    fn load(&self, path: &str) -> Result<Packaged, SourceError> {
        let key = trim_slashes(path);

        if let Some(entry) = self.entries.get(key) {
            return Ok(Packaged::File {
                bytes: entry.bytes.clone(),
                modified: entry.modified,
            });
        }

        if self.is_directory(key) {
            return Ok(Packaged::Directory);
        }

        Err(SourceError::NotFound(key.to_string()))
    }

    fn describe(&self, path: &str) -> String {
        format!("memory:{}", trim_slashes(path))
    }
}
