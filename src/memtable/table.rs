//! MemTable implementation
//!
//! Skip-list-based memtable; the skip list does its own locking.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::codec::{Entry, ValueStruct};
use crate::config::Config;
use crate::error::Result;

use super::{MemTableEntry, SkipList};

/// In-memory table for recent writes
pub struct MemTable {
    list: SkipList,
}

impl MemTable {
    /// Create an empty MemTable sized by `config`
    pub fn new(config: &Config) -> Self {
        let arena = Arena::new(config.arena_size, config.arena_grow);
        let list = match config.rng_seed {
            Some(seed) => SkipList::with_rng(
                arena,
                config.max_level,
                Box::new(StdRng::seed_from_u64(seed)),
            ),
            None => SkipList::new(arena, config.max_level),
        };

        debug!(
            arena_size = config.arena_size,
            max_level = list.max_level(),
            "Created memtable"
        );

        Self { list }
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let entry = self.list.lookup(key)?;
        Ok(entry.map(|entry| entry.value.into()))
    }

    /// Put a key-value pair
    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        self.list.insert_or_update(Entry::new(key, value))
    }

    /// Delete a key (inserts tombstone)
    pub fn delete(&self, key: impl Into<Bytes>) -> Result<()> {
        self.list
            .insert_or_update(Entry::with_value(key, ValueStruct::tombstone()))
    }

    /// Bytes of live keys and encoded values
    pub fn size(&self) -> usize {
        self.list.byte_size()
    }

    /// Bytes allocated from the arena so far
    pub fn arena_size(&self) -> usize {
        self.list.arena_size()
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Check if the arena footprint reached `size_limit`
    pub fn should_flush(&self, size_limit: usize) -> bool {
        let used = self.arena_size();
        let full = used >= size_limit;
        if full {
            warn!(used, size_limit, "Memtable reached its flush limit");
        }
        full
    }

    /// All entries in sorted key order
    pub fn iter(&self) -> Result<Vec<(Bytes, MemTableEntry)>> {
        let entries = self.list.entries()?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.key, entry.value.into()))
            .collect())
    }
}
