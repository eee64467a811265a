//! Cache Module
//!
//! Bounded admission cache sitting in front of the memtable.
//!
//! ## Responsibilities
//! - Keep hot values in a fixed number of slots
//! - Resist pollution from scans and one-off reads
//! - Hand evicted values back to the caller
//!
//! ## Layout
//! ```text
//!   set ──► ┌──────────┐ evict ┌────────────── main ───────────────┐
//!           │  Window  │──────►│  admit?  ┌───────────┐ hit ┌───────────┐
//!           │  (LRU)   │       │ ───────► │ Probation │────►│ Protected │
//!           └──────────┘       │          └───────────┘◄────└───────────┘
//!                              └─────────────────────────── demote ────┘
//! ```
//! A candidate pushed out of the window only displaces the probation tail
//! when its estimated access frequency is at least the tail's. The estimate
//! is one for a key the Bloom filter doorkeeper has seen, plus its count in a
//! count-min sketch of later reads. Both are aged every `10 × capacity` reads.

mod doorkeeper;
mod list;
mod segmented;
mod sketch;
mod window;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::Config;

use doorkeeper::Doorkeeper;
use list::Slab;
use segmented::SegmentedLru;
use sketch::CmSketch;
use window::WindowLru;

/// Doorkeeper false positive rate
const DOORKEEPER_FP_RATE: f64 = 0.01;

/// Reads between two agings of the frequency estimates, per slot
const SAMPLE_FACTOR: usize = 10;

/// Seed for the sketch row hashes when none is configured
const DEFAULT_SKETCH_SEED: u64 = 0x5EED;

/// Stage an item currently lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Window,
    Probation,
    Protected,
}

/// One cached value and its bookkeeping
#[derive(Debug)]
pub(crate) struct StoreItem<V> {
    pub(crate) stage: Stage,
    pub(crate) key_hash: u64,
    pub(crate) conflict_hash: u64,
    pub(crate) value: V,
}

impl<V> StoreItem<V> {
    pub(crate) fn new(key_hash: u64, conflict_hash: u64, value: V) -> Self {
        Self {
            stage: Stage::Window,
            key_hash,
            conflict_hash,
            value,
        }
    }
}

/// A value the cache gave up, returned to the caller for cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted<V> {
    pub key_hash: u64,
    pub value: V,
}

impl<V> From<StoreItem<V>> for Evicted<V> {
    fn from(item: StoreItem<V>) -> Self {
        Self {
            key_hash: item.key_hash,
            value: item.value,
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Primary and conflict hash of a key
pub fn key_to_hash(key: &[u8]) -> (u64, u64) {
    (
        xxhash_rust::xxh64::xxh64(key, 0),
        crc32fast::hash(key) as u64,
    )
}

/// Window + segmented LRU cache with frequency-based admission
///
/// ## Concurrency:
/// - `policy`: one Mutex over every stage, the sketch and the doorkeeper.
///   Promotions and admissions touch several stages and must not interleave.
/// - `hits`, `misses`: atomics, readable without the lock
pub struct Cache<V> {
    policy: Mutex<Policy<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Cache<V> {
    /// Cache of `capacity` entries with the default stage shares
    pub fn new(capacity: usize) -> Self {
        let defaults = Config::default();
        Self::with_shares(
            capacity,
            defaults.window_percent,
            defaults.probation_percent,
            DEFAULT_SKETCH_SEED,
        )
    }

    /// Cache sized by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::with_shares(
            config.cache_capacity,
            config.window_percent,
            config.probation_percent,
            config.rng_seed.unwrap_or(DEFAULT_SKETCH_SEED),
        )
    }

    /// Cache of `capacity` entries split into stages
    ///
    /// `window_percent` of the capacity goes to the window, the rest to the
    /// main cache, of which `probation_percent` goes to probation. Every
    /// stage gets at least one slot, so `capacity` is raised to 3 if smaller.
    pub fn with_shares(
        capacity: usize,
        window_percent: usize,
        probation_percent: usize,
        seed: u64,
    ) -> Self {
        let capacity = capacity.max(3);
        let window = (capacity * window_percent / 100).clamp(1, capacity - 2);
        let main = capacity - window;
        let probation = (main * probation_percent / 100).clamp(1, main - 1);
        let protected = main - probation;

        debug!(capacity, window, probation, protected, "Creating admission cache");

        Self {
            policy: Mutex::new(Policy {
                slab: Slab::with_capacity(capacity),
                data: HashMap::with_capacity(capacity),
                window: WindowLru::new(window),
                main: SegmentedLru::new(probation, protected),
                sketch: CmSketch::new(capacity, seed),
                doorkeeper: Doorkeeper::new(capacity, DOORKEEPER_FP_RATE),
                accesses: 0,
                sample: capacity * SAMPLE_FACTOR,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up `key`, refreshing its recency or promoting it on a hit
    pub fn get(&self, key: &[u8]) -> Option<V> {
        let (key_hash, conflict_hash) = key_to_hash(key);
        let value = self.policy.lock().get(key_hash, conflict_hash);

        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Insert or replace the value for `key`
    ///
    /// Returns whatever the cache gave up to make room: the candidate that
    /// lost admission, the probation tail it displaced, or the previous
    /// occupant of a colliding hash slot.
    pub fn set(&self, key: &[u8], value: V) -> Option<Evicted<V>> {
        let (key_hash, conflict_hash) = key_to_hash(key);
        self.policy
            .lock()
            .set(StoreItem::new(key_hash, conflict_hash, value))
            .map(Evicted::from)
    }

    /// Drop `key` from the cache, returning its value
    pub fn remove(&self, key: &[u8]) -> Option<V> {
        let (key_hash, conflict_hash) = key_to_hash(key);
        self.policy.lock().remove(key_hash, conflict_hash)
    }

    /// Stage currently holding `key`
    pub fn stage_of(&self, key: &[u8]) -> Option<Stage> {
        let (key_hash, conflict_hash) = key_to_hash(key);
        let policy = self.policy.lock();
        let idx = *policy.data.get(&key_hash)?;
        policy
            .slab
            .get(idx)
            .filter(|item| item.conflict_hash == conflict_hash)
            .map(|item| item.stage)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.policy.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots across all stages
    pub fn capacity(&self) -> usize {
        let policy = self.policy.lock();
        policy.window.capacity() + policy.main.capacity()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Everything guarded by the cache lock
struct Policy<V> {
    slab: Slab<StoreItem<V>>,

    /// key hash → slot, shared by all stages
    data: HashMap<u64, usize>,

    window: WindowLru,
    main: SegmentedLru,
    sketch: CmSketch,
    doorkeeper: Doorkeeper,

    /// Reads since the last aging
    accesses: usize,
    sample: usize,
}

impl<V: Clone> Policy<V> {
    fn get(&mut self, key_hash: u64, conflict_hash: u64) -> Option<V> {
        self.record_access(key_hash);

        let idx = *self.data.get(&key_hash)?;
        let item = self.slab.get(idx)?;
        if item.conflict_hash != conflict_hash {
            return None;
        }

        let stage = item.stage;
        let value = item.value.clone();
        self.touch(idx, stage);
        Some(value)
    }

    fn set(&mut self, item: StoreItem<V>) -> Option<StoreItem<V>> {
        if let Some(&idx) = self.data.get(&item.key_hash) {
            return self.overwrite(idx, item);
        }

        let candidate = self.window.add(&mut self.slab, &mut self.data, item)?;

        let Some(victim) = self.main.victim(&self.slab) else {
            return self.main.add(&mut self.slab, &mut self.data, candidate);
        };
        let victim_hash = victim.key_hash;

        let candidate_count = self.estimate(candidate.key_hash);
        let victim_count = self.estimate(victim_hash);
        if candidate_count < victim_count {
            trace!(
                candidate_count,
                victim_count,
                "Window candidate lost admission"
            );
            return Some(candidate);
        }

        trace!(candidate_count, victim_count, "Window candidate admitted");
        self.main.add(&mut self.slab, &mut self.data, candidate)
    }

    /// Replace the item in an occupied slot and refresh it
    ///
    /// A different conflict hash means another key shares the slot's hash;
    /// the old occupant is handed back.
    fn overwrite(&mut self, idx: usize, item: StoreItem<V>) -> Option<StoreItem<V>> {
        let slot = self.slab.get_mut(idx)?;
        let stage = slot.stage;
        let old_conflict = slot.conflict_hash;

        let StoreItem {
            key_hash,
            conflict_hash,
            value,
            ..
        } = item;
        let old_value = std::mem::replace(&mut slot.value, value);
        slot.conflict_hash = conflict_hash;

        self.touch(idx, stage);

        if old_conflict == conflict_hash {
            return None;
        }
        Some(StoreItem {
            stage,
            key_hash,
            conflict_hash: old_conflict,
            value: old_value,
        })
    }

    fn remove(&mut self, key_hash: u64, conflict_hash: u64) -> Option<V> {
        let idx = *self.data.get(&key_hash)?;
        let item = self.slab.get(idx)?;
        if item.conflict_hash != conflict_hash {
            return None;
        }

        let stage = item.stage;
        match stage {
            Stage::Window => self.window.unlink(&mut self.slab, idx),
            Stage::Probation | Stage::Protected => self.main.unlink(&mut self.slab, idx),
        }
        self.data.remove(&key_hash);
        self.slab.remove(idx).map(|item| item.value)
    }

    fn touch(&mut self, idx: usize, stage: Stage) {
        match stage {
            Stage::Window => self.window.touch(&mut self.slab, idx),
            Stage::Probation | Stage::Protected => self.main.get(&mut self.slab, idx),
        }
    }

    /// Reads of `key_hash` since the last aging, approximately
    ///
    /// The doorkeeper holds the first read, the sketch every later one.
    fn estimate(&self, key_hash: u64) -> u64 {
        self.sketch.estimate(key_hash) + u64::from(self.doorkeeper.contains(key_hash))
    }

    /// Count a read of `key_hash`, aging the estimates every `sample` reads
    fn record_access(&mut self, key_hash: u64) {
        self.accesses += 1;
        if self.accesses >= self.sample {
            debug!(accesses = self.accesses, "Aging cache frequency estimates");
            self.sketch.reset();
            self.doorkeeper.reset();
            self.accesses = 0;
        }

        if self.doorkeeper.allow(key_hash) {
            self.sketch.increment(key_hash);
        }
    }
}
