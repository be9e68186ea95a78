//! Mtime-based freshness detection.
//!
//! Filesystem resources compare the on-disk modification time with the one
//! captured at load time. Timestamps sent to clients are truncated to whole
//! seconds because `If-Modified-Since` carries no sub-second precision.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Drop the sub-second part of a timestamp.
pub fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => time,
    }
}

/// Timestamp for a packaged resource.
///
/// A missing time, or one not after the epoch, is replaced by the current
/// time. The result is truncated to whole seconds.
pub fn packaged_timestamp(modified: Option<SystemTime>) -> SystemTime {
    let usable = modified.filter(|t| t.duration_since(UNIX_EPOCH).is_ok_and(|d| !d.is_zero()));
    truncate_to_secs(usable.unwrap_or_else(SystemTime::now))
}

/// Seconds since the epoch, for logs and tests.
pub fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
