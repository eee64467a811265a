//! Engine Module
//!
//! Coordinates the active memtable and the admission cache.
//!
//! ## Responsibilities
//! - Route writes into the memtable and keep the cache coherent
//! - Serve reads from the cache first, then the memtable
//! - Offer memtable hits to the cache
//! - Report when the memtable should be flushed

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::{Cache, CacheStats};
use crate::config::Config;
use crate::error::Result;
use crate::memtable::{MemTable, MemTableEntry};

/// The in-memory storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete): exclusive `write_lock`, held across the
///   memtable update and the cache invalidation
/// - **Reads** (get): cache hits take no engine lock. A miss holds
///   `write_lock` shared while it reads the memtable and fills the cache, so
///   a fill never lands between a write and its invalidation.
pub struct Engine {
    config: Config,

    /// Active memtable receiving all writes
    memtable: MemTable,

    /// Read cache over the memtable
    cache: Cache<Bytes>,

    /// Orders writes against cache fills
    write_lock: RwLock<()>,
}

impl Engine {
    /// Create an engine after validating `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let memtable = MemTable::new(&config);
        let cache = Cache::from_config(&config);

        debug!(
            cache_capacity = cache.capacity(),
            memtable_size_limit = config.memtable_size_limit,
            "Engine initialized"
        );

        Ok(Self {
            config,
            memtable,
            cache,
            write_lock: RwLock::new(()),
        })
    }

    /// Get the value for `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }

        let _fill = self.write_lock.read();
        match self.memtable.get(key)? {
            Some(MemTableEntry::Value(value)) => {
                if let Some(evicted) = self.cache.set(key, value.clone()) {
                    trace!(key_hash = evicted.key_hash, "Cache gave up a value");
                }
                Ok(Some(value))
            }
            Some(MemTableEntry::Tombstone) | None => Ok(None),
        }
    }

    /// Store `value` under `key`
    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        let key = key.into();
        let _write = self.write_lock.write();
        self.memtable.put(key.clone(), value)?;
        self.cache.remove(&key);
        Ok(())
    }

    /// Delete `key`
    pub fn delete(&self, key: impl Into<Bytes>) -> Result<()> {
        let key = key.into();
        let _write = self.write_lock.write();
        self.memtable.delete(key.clone())?;
        self.cache.remove(&key);
        Ok(())
    }

    /// Whether the memtable reached the configured size limit
    pub fn should_flush(&self) -> bool {
        self.memtable.should_flush(self.config.memtable_size_limit)
    }

    pub fn memtable(&self) -> &MemTable {
        &self.memtable
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
