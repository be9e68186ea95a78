//! Freshness detection: mtime for filesystem-backed resources.

pub mod mtime;

pub use mtime::{get_mtime, truncate_to_secs};
