//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered iteration for flushing
//!
//! ## Data Structure Choice
//! An arena-backed skip list behind one RwLock:
//! - Ordered keys with O(log n) expected insert and lookup
//! - Keys, values and nodes carved from a single buffer per memtable,
//!   freed all at once when the memtable is dropped
//! - Links are arena offsets, so the buffer can grow without fix-ups

mod skiplist;
mod table;

pub use skiplist::{score, HeightRng, SkipList};
pub use table::MemTable;

use bytes::Bytes;

use crate::codec::ValueStruct;

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    /// A live value
    Value(Bytes),

    /// A tombstone (deleted key)
    Tombstone,
}

impl From<ValueStruct> for MemTableEntry {
    fn from(value: ValueStruct) -> Self {
        if value.is_deleted() {
            MemTableEntry::Tombstone
        } else {
            MemTableEntry::Value(value.value)
        }
    }
}
