//! Cache sizing specification.
//!
//! A spec is a comma-separated list of `key=value` pairs:
//!
//! ```text
//! maximumSize=100
//! maximumWeight=10485760,expireAfterAccess=10m
//! ```
//!
//! | Key                 | Value                                  |
//! |---------------------|----------------------------------------|
//! | `maximumSize`       | entry count bound                      |
//! | `maximumWeight`     | total byte bound (weight = byte length) |
//! | `expireAfterAccess` | duration (`30s`, `10m`, `1h`, `2d`)     |
//! | `expireAfterWrite`  | duration                               |
//! | `initialCapacity`   | map capacity hint                      |
//!
//! `maximumSize` and `maximumWeight` are mutually exclusive.

use crate::config::ConfigError;
use std::fmt;
use std::time::Duration;

/// Spec used when none is configured.
pub const DEFAULT_CACHE_SPEC: &str = "maximumSize=100";

/// Eviction bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// At most this many entries.
    Size(u64),
    /// At most this many bytes across all entries.
    Weight(u64),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSpec {
    pub bound: Bound,
    pub expire_after_access: Option<Duration>,
    pub expire_after_write: Option<Duration>,
    pub initial_capacity: Option<usize>,
}

impl Default for CacheSpec {
    fn default() -> Self {
        Self {
            bound: Bound::Size(100),
            expire_after_access: None,
            expire_after_write: None,
            initial_capacity: None,
        }
    }
}

impl CacheSpec {
    /// Parse a spec string. An empty string yields an unbounded cache.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut parsed = Self {
            bound: Bound::Unbounded,
            ..Self::default()
        };

        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| ConfigError::cache_spec(spec, format!("`{pair}` is not key=value")))?;

            match key {
                "maximumSize" | "maximumWeight" => {
                    if parsed.bound != Bound::Unbounded {
                        return Err(ConfigError::cache_spec(
                            spec,
                            "maximumSize and maximumWeight may only be set once, and not together",
                        ));
                    }
                    let n = parse_u64(spec, key, value)?;
                    parsed.bound = if key == "maximumSize" {
                        Bound::Size(n)
                    } else {
                        Bound::Weight(n)
                    };
                }
                "expireAfterAccess" => {
                    set_once(spec, key, &mut parsed.expire_after_access, parse_duration(spec, key, value)?)?;
                }
                "expireAfterWrite" => {
                    set_once(spec, key, &mut parsed.expire_after_write, parse_duration(spec, key, value)?)?;
                }
                "initialCapacity" => {
                    let n = parse_u64(spec, key, value)?;
                    let n = usize::try_from(n)
                        .map_err(|_| ConfigError::cache_spec(spec, format!("{key} too large")))?;
                    set_once(spec, key, &mut parsed.initial_capacity, n)?;
                }
                other => {
                    return Err(ConfigError::cache_spec(spec, format!("unknown key `{other}`")));
                }
            }
        }

        Ok(parsed)
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self.bound, Bound::Weight(_))
    }
}

impl fmt::Display for CacheSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match self.bound {
            Bound::Size(n) => parts.push(format!("maximumSize={n}")),
            Bound::Weight(n) => parts.push(format!("maximumWeight={n}")),
            Bound::Unbounded => {}
        }
        if let Some(d) = self.expire_after_access {
            parts.push(format!("expireAfterAccess={}s", d.as_secs()));
        }
        if let Some(d) = self.expire_after_write {
            parts.push(format!("expireAfterWrite={}s", d.as_secs()));
        }
        if let Some(n) = self.initial_capacity {
            parts.push(format!("initialCapacity={n}"));
        }
        write!(f, "{}", parts.join(","))
    }
}

fn set_once<T>(spec: &str, key: &str, slot: &mut Option<T>, value: T) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Err(ConfigError::cache_spec(spec, format!("{key} was already set")));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_u64(spec: &str, key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::cache_spec(spec, format!("{key} value `{value}` is not a number")))
}

/// Parse `<n><unit>` with unit one of `s`, `m`, `h`, `d`.
fn parse_duration(spec: &str, key: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::cache_spec(spec, format!("{key} value `{value}` is not a duration"));

    let unit = value.chars().last().ok_or_else(invalid)?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    let n: u64 = value[..value.len() - 1].parse().map_err(|_| invalid())?;
    Ok(Duration::from_secs(n.saturating_mul(multiplier)))
}
