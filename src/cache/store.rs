//! Memoizing resolution cache.
//!
//! Each key owns a slot holding a `OnceLock`. The first caller for an
//! uncached key runs the loader inside `get_or_init`; concurrent callers for
//! the same key block on that slot and observe the same result. The map is
//! only touched to find or insert slots, never while a load runs, so distinct
//! keys resolve in parallel.
//!
//! Not-found results are handed to every waiter and then dropped from the
//! map, so a later request retries the lookup.

use super::spec::{Bound, CacheSpec};
use crate::asset::{Resolver, Resource};
use crate::debug;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Computes the value for a missing key.
pub trait Loader: Send + Sync {
    fn load(&self, key: &str) -> Option<Resource>;
}

impl Loader for Resolver {
    fn load(&self, key: &str) -> Option<Resource> {
        self.resolve(key)
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug)]
struct Slot {
    cell: OnceLock<Option<Arc<Resource>>>,
    /// Logical clock value of the last access, for LRU ordering.
    tick: AtomicU64,
    /// Milliseconds since cache creation.
    accessed_ms: AtomicU64,
    written_ms: AtomicU64,
    /// Byte length at load time.
    weight: AtomicU64,
    /// Holds a resource counted toward the bound.
    counted: AtomicBool,
}

impl Slot {
    fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            tick: AtomicU64::new(0),
            accessed_ms: AtomicU64::new(0),
            written_ms: AtomicU64::new(0),
            weight: AtomicU64::new(0),
            counted: AtomicBool::new(false),
        }
    }

    fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Resolution cache keyed by request path.
pub struct ResolutionCache<L: Loader = Resolver> {
    loader: L,
    spec: CacheSpec,
    entries: DashMap<String, Arc<Slot>>,
    clock: AtomicU64,
    epoch: Instant,
    weight: AtomicU64,
    /// Entries holding a resource; loads in flight are not counted.
    resident: AtomicU64,
    counters: Counters,
}

impl<L: Loader> ResolutionCache<L> {
    pub fn new(loader: L, spec: CacheSpec) -> Self {
        let entries = match spec.initial_capacity {
            Some(capacity) => DashMap::with_capacity(capacity),
            None => DashMap::new(),
        };
        Self {
            loader,
            spec,
            entries,
            clock: AtomicU64::new(0),
            epoch: Instant::now(),
            weight: AtomicU64::new(0),
            resident: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn spec(&self) -> &CacheSpec {
        &self.spec
    }

    /// Cached resource for `key`, loading it on a miss.
    ///
    /// At most one load per key is in flight at any time.
    pub fn get(&self, key: &str) -> Option<Arc<Resource>> {
        let slot = self.slot_for(key);

        let mut loaded_here = false;
        let value = slot
            .cell
            .get_or_init(|| {
                loaded_here = true;
                self.counters.loads.fetch_add(1, Ordering::Relaxed);
                let loaded = self.loader.load(key).map(Arc::new);
                // Accounting happens before the slot becomes visible as ready,
                // so a concurrent eviction always releases what was added.
                if let Some(resource) = &loaded {
                    let weight = resource.len() as u64;
                    slot.weight.store(weight, Ordering::Relaxed);
                    self.weight.fetch_add(weight, Ordering::Relaxed);
                    slot.counted.store(true, Ordering::Relaxed);
                    self.resident.fetch_add(1, Ordering::Relaxed);
                }
                slot.written_ms.store(self.now_ms(), Ordering::Relaxed);
                loaded
            })
            .clone();

        self.touch(&slot);

        if !loaded_here {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return value;
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        if value.is_some() {
            // Invalidated while loading: the slot is gone and its weight with it.
            if !self.is_live(key, &slot) {
                self.release(&slot);
            }
            self.evict_over_bound();
        } else {
            self.entries.remove_if(key, |_, s| Arc::ptr_eq(s, &slot));
        }
        value
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        if let Some((_, slot)) = self.entries.remove(key) {
            self.release(&slot);
        }
    }

    pub fn invalidate_all(&self) {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.invalidate(&key);
        }
    }

    /// Number of entries, including loads in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total byte weight of cached resources.
    pub fn weight(&self) -> u64 {
        self.weight.load(Ordering::Relaxed)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|s| s.is_ready())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    // ========================================================================
    // internals
    // ========================================================================

    /// Find the live slot for `key` or insert an empty one.
    ///
    /// No map guard outlives this function.
    fn slot_for(&self, key: &str) -> Arc<Slot> {
        let existing = self.entries.get(key).map(|s| Arc::clone(s.value()));
        if let Some(slot) = existing {
            if !self.is_expired(&slot) {
                return slot;
            }
            self.remove_slot(key, &slot);
            debug!("cache"; "expired {}", key);
        }

        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Slot::new()));
        Arc::clone(entry.value())
    }

    fn is_live(&self, key: &str, slot: &Arc<Slot>) -> bool {
        self.entries
            .get(key)
            .is_some_and(|s| Arc::ptr_eq(s.value(), slot))
    }

    fn touch(&self, slot: &Slot) {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        slot.tick.store(tick, Ordering::Relaxed);
        slot.accessed_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn is_expired(&self, slot: &Slot) -> bool {
        if !slot.is_ready() {
            return false;
        }
        let now = self.now_ms();
        let older_than = |since: &AtomicU64, limit: std::time::Duration| {
            let limit = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            now.saturating_sub(since.load(Ordering::Relaxed)) >= limit
        };

        self.spec
            .expire_after_write
            .is_some_and(|d| older_than(&slot.written_ms, d))
            || self
                .spec
                .expire_after_access
                .is_some_and(|d| older_than(&slot.accessed_ms, d))
    }

    fn is_over_bound(&self) -> bool {
        match self.spec.bound {
            Bound::Size(max) => self.resident.load(Ordering::Relaxed) > max,
            Bound::Weight(max) => self.weight() > max,
            Bound::Unbounded => false,
        }
    }

    /// Evict least recently accessed ready entries until within bound.
    ///
    /// One pass over the map orders the candidates; loads in flight are
    /// never candidates.
    fn evict_over_bound(&self) {
        if !self.is_over_bound() {
            return;
        }

        let mut candidates: Vec<(u64, String, Arc<Slot>)> = self
            .entries
            .iter()
            .filter(|e| e.value().is_ready())
            .map(|e| {
                let slot = e.value();
                (slot.tick.load(Ordering::Relaxed), e.key().clone(), Arc::clone(slot))
            })
            .collect();
        candidates.sort_unstable_by_key(|(tick, ..)| *tick);

        for (_, key, slot) in candidates {
            if !self.is_over_bound() {
                break;
            }
            if self.remove_slot(&key, &slot) {
                debug!("cache"; "evicted {}", key);
            }
        }
    }

    /// Remove `slot` if it is still the entry for `key`.
    fn remove_slot(&self, key: &str, slot: &Arc<Slot>) -> bool {
        match self.entries.remove_if(key, |_, s| Arc::ptr_eq(s, slot)) {
            Some((_, removed)) => {
                self.release(&removed);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    fn release(&self, slot: &Slot) {
        let weight = slot.weight.swap(0, Ordering::Relaxed);
        self.weight.fetch_sub(weight, Ordering::Relaxed);
        if slot.counted.swap(false, Ordering::Relaxed) {
            self.resident.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl<L: Loader> std::fmt::Debug for ResolutionCache<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("spec", &self.spec.to_string())
            .field("len", &self.len())
            .field("weight", &self.weight())
            .finish_non_exhaustive()
    }
}
