//! Resolved resources.
//!
//! Two representations share one read contract:
//!
//! - [`PackagedResource`]: bytes from a packaged source, fixed for the
//!   lifetime of the process.
//! - [`FileResource`]: bytes from a file on disk, reloaded whenever the file's
//!   modification time differs from the one captured at the last load.
//!
//! Readers always receive an `Arc` snapshot of the buffer, so a concurrent
//! reload is observed either entirely or not at all.

use crate::debug;
use crate::freshness::mtime::{get_mtime, packaged_timestamp};
use parking_lot::Mutex;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Content and timestamp observed together.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bytes: Arc<[u8]>,
    pub last_modified: SystemTime,
}

/// A resolved asset.
#[derive(Debug)]
pub enum Resource {
    Packaged(PackagedResource),
    File(FileResource),
}

impl Resource {
    /// Raw content. Filesystem resources are revalidated first.
    pub fn bytes(&self) -> Arc<[u8]> {
        self.snapshot().bytes
    }

    /// Readable stream over the current content.
    pub fn reader(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(self.bytes())
    }

    pub fn last_modified(&self) -> SystemTime {
        self.snapshot().last_modified
    }

    /// Content and timestamp from the same load.
    pub fn snapshot(&self) -> Snapshot {
        match self {
            Self::Packaged(r) => r.snapshot(),
            Self::File(r) => r.snapshot(),
        }
    }

    /// Always true: absence is reported by not returning a resource.
    pub fn exists(&self) -> bool {
        true
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where the content came from, for logs.
    pub fn origin(&self) -> String {
        match self {
            Self::Packaged(r) => r.origin.clone(),
            Self::File(r) => r.path.display().to_string(),
        }
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

// ============================================================================
// PackagedResource
// ============================================================================

/// Immutable resource loaded from a packaged source.
#[derive(Debug)]
pub struct PackagedResource {
    origin: String,
    bytes: Arc<[u8]>,
    last_modified: SystemTime,
}

impl PackagedResource {
    /// Wrap loaded bytes. The timestamp is truncated to whole seconds and
    /// replaced by the current time when missing or not after the epoch.
    pub fn new(origin: impl Into<String>, bytes: Vec<u8>, modified: Option<SystemTime>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
            last_modified: packaged_timestamp(modified),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            bytes: Arc::clone(&self.bytes),
            last_modified: self.last_modified,
        }
    }
}

// ============================================================================
// FileResource
// ============================================================================

#[derive(Debug)]
struct FileState {
    bytes: Arc<[u8]>,
    modified: Option<SystemTime>,
}

/// Resource backed by a file that may change while the process runs.
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileResource {
    /// Load `path` for the first time.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let state = read_state(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revalidate against the on-disk mtime and return the current content.
    ///
    /// The check and the reload happen under the resource's lock. A failed
    /// reload keeps serving the previous content.
    fn snapshot(&self) -> Snapshot {
        let mut state = self.state.lock();

        if get_mtime(&self.path) != state.modified {
            match read_state(&self.path) {
                Ok(fresh) => *state = fresh,
                Err(e) => {
                    debug!("assets"; "reload of {} failed, keeping previous content: {}", self.path.display(), e);
                }
            }
        }

        Snapshot {
            bytes: Arc::clone(&state.bytes),
            last_modified: state.modified.unwrap_or(UNIX_EPOCH),
        }
    }
}

/// Stat before reading: a write racing the read leaves a stale mtime behind,
/// which triggers another reload on the next access.
fn read_state(path: &Path) -> io::Result<FileState> {
    let modified = path.metadata()?.modified().ok();
    let bytes = std::fs::read(path)?;
    Ok(FileState {
        bytes: bytes.into(),
        modified,
    })
}
