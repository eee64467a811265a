//! MemTable Tests
//!
//! Tests verify:
//! - Basic CRUD operations
//! - Size tracking
//! - Tombstone handling
//! - Sorted iteration
//! - Flush trigger
//! - Concurrent access patterns

use bytes::Bytes;
use lsmkit::codec::ValueStruct;
use lsmkit::config::Config;
use lsmkit::memtable::{MemTable, MemTableEntry};
use lsmkit::LsmError;

// =============================================================================
// Helper Functions
// =============================================================================

fn new_memtable() -> MemTable {
    let config = Config::builder()
        .arena_size(64 * 1024)
        .rng_seed(7)
        .build();
    MemTable::new(&config)
}

fn value(bytes: &'static [u8]) -> Option<MemTableEntry> {
    Some(MemTableEntry::Value(Bytes::from_static(bytes)))
}

/// Footprint of a live key/value pair in the memtable's byte accounting
fn footprint(key: &[u8], value: &'static [u8]) -> usize {
    key.len() + ValueStruct::new(value).encoded_size()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = new_memtable();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_put_and_get() {
    let memtable = new_memtable();

    memtable.put(&b"key1"[..], &b"value1"[..]).unwrap();

    assert_eq!(memtable.get(b"key1").unwrap(), value(b"value1"));
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = new_memtable();
    assert_eq!(memtable.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_put_multiple_entries() {
    let memtable = new_memtable();

    memtable.put("key1", "value1").unwrap();
    memtable.put("key2", "value2").unwrap();
    memtable.put("key3", "value3").unwrap();

    assert_eq!(memtable.entry_count(), 3);
    assert_eq!(memtable.get(b"key1").unwrap(), value(b"value1"));
    assert_eq!(memtable.get(b"key2").unwrap(), value(b"value2"));
    assert_eq!(memtable.get(b"key3").unwrap(), value(b"value3"));
}

#[test]
fn test_put_overwrites_existing() {
    let memtable = new_memtable();

    memtable.put("key1", "value1").unwrap();
    memtable.put("key1", "value2").unwrap();

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"key1").unwrap(), value(b"value2"));
}

// =============================================================================
// Delete / Tombstone Tests
// =============================================================================

#[test]
fn test_delete_creates_tombstone() {
    let memtable = new_memtable();

    memtable.put("key1", "value1").unwrap();
    memtable.delete("key1").unwrap();

    assert_eq!(memtable.get(b"key1").unwrap(), Some(MemTableEntry::Tombstone));
    assert_eq!(memtable.entry_count(), 1); // Tombstone still counts as entry
}

#[test]
fn test_delete_nonexistent_key() {
    let memtable = new_memtable();

    memtable.delete("nonexistent").unwrap();

    assert_eq!(
        memtable.get(b"nonexistent").unwrap(),
        Some(MemTableEntry::Tombstone)
    );
    assert_eq!(memtable.entry_count(), 1);
}

#[test]
fn test_put_after_delete() {
    let memtable = new_memtable();

    memtable.put("key1", "value1").unwrap();
    memtable.delete("key1").unwrap();
    memtable.put("key1", "value2").unwrap();

    assert_eq!(memtable.get(b"key1").unwrap(), value(b"value2"));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracking_put() {
    let memtable = new_memtable();

    memtable.put("key", "value").unwrap();

    assert_eq!(memtable.size(), footprint(b"key", b"value"));
}

#[test]
fn test_size_tracking_overwrite() {
    let memtable = new_memtable();

    memtable.put("key", "short").unwrap();
    let size_after_first = memtable.size();

    memtable.put("key", "much_longer_value").unwrap();
    let size_after_second = memtable.size();

    assert_eq!(size_after_first, footprint(b"key", b"short"));
    assert_eq!(size_after_second, footprint(b"key", b"much_longer_value"));
}

#[test]
fn test_size_tracking_delete() {
    let memtable = new_memtable();

    memtable.put("key", "value").unwrap();
    memtable.delete("key").unwrap();

    // Tombstone = key + empty value
    assert_eq!(memtable.size(), footprint(b"key", b""));
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iter_empty() {
    let memtable = new_memtable();
    assert!(memtable.iter().unwrap().is_empty());
}

#[test]
fn test_iter_sorted_order() {
    let memtable = new_memtable();

    // Insert in random order
    memtable.put("cherry", "3").unwrap();
    memtable.put("apple", "1").unwrap();
    memtable.put("banana", "2").unwrap();

    let entries = memtable.iter().unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, "apple"); // Sorted!
    assert_eq!(entries[1].0, "banana");
    assert_eq!(entries[2].0, "cherry");
}

#[test]
fn test_iter_includes_tombstones() {
    let memtable = new_memtable();

    memtable.put("key1", "value1").unwrap();
    memtable.delete("key2").unwrap();
    memtable.put("key3", "value3").unwrap();

    let entries = memtable.iter().unwrap();

    assert_eq!(entries.len(), 3);
    assert!(matches!(entries[0].1, MemTableEntry::Value(_)));
    assert!(matches!(entries[1].1, MemTableEntry::Tombstone));
    assert!(matches!(entries[2].1, MemTableEntry::Value(_)));
}

#[test]
fn test_iter_is_a_snapshot() {
    let memtable = new_memtable();

    memtable.put("key", "value").unwrap();
    let entries = memtable.iter().unwrap();

    // Modify memtable after getting snapshot
    memtable.put("key", "modified").unwrap();

    assert_eq!(entries[0].1, MemTableEntry::Value(Bytes::from_static(b"value")));
}

// =============================================================================
// Should Flush Tests
// =============================================================================

#[test]
fn test_should_flush_under_limit() {
    let memtable = new_memtable();

    memtable.put("key", "value").unwrap();

    assert!(!memtable.should_flush(1024 * 1024));
}

#[test]
fn test_should_flush_at_limit() {
    let memtable = new_memtable();

    memtable.put("key", "value").unwrap();

    let used = memtable.arena_size();
    assert!(memtable.should_flush(used));
    assert!(memtable.should_flush(used - 1));
    assert!(!memtable.should_flush(used + 1));
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn test_empty_key_rejected() {
    let memtable = new_memtable();

    assert_eq!(memtable.put("", "value"), Err(LsmError::InvalidEntry));
    assert!(memtable.is_empty());
}

#[test]
fn test_empty_value() {
    let memtable = new_memtable();

    memtable.put("key", "").unwrap();

    assert_eq!(memtable.get(b"key").unwrap(), value(b""));
}

#[test]
fn test_large_value() {
    let memtable = new_memtable();

    let large_value = vec![0xAB; 1024 * 1024]; // 1 MB, larger than the arena
    memtable.put("big_key", large_value.clone()).unwrap();

    match memtable.get(b"big_key").unwrap() {
        Some(MemTableEntry::Value(v)) => assert_eq!(v.as_ref(), large_value.as_slice()),
        other => panic!("Expected Value, got {:?}", other),
    }
}

#[test]
fn test_many_entries() {
    let memtable = new_memtable();

    for i in 0..1000 {
        let key = format!("key{:04}", i).into_bytes();
        let value = format!("value{}", i).into_bytes();
        memtable.put(key, value).unwrap();
    }

    assert_eq!(memtable.entry_count(), 1000);

    // Verify sorted order
    let entries = memtable.iter().unwrap();
    for i in 0..999 {
        assert!(entries[i].0 < entries[i + 1].0);
    }
}

// =============================================================================
// Concurrent Access Tests (Basic)
// =============================================================================

#[test]
fn test_concurrent_reads() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(new_memtable());
    memtable.put("key", "value").unwrap();

    let mut handles = vec![];

    for _ in 0..10 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(mt.get(b"key").unwrap(), value(b"value"));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(new_memtable());

    let mut handles = vec![];

    for i in 0..10 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for j in 0..10 {
                let key = format!("key{}_{}", i, j).into_bytes();
                let value = format!("value{}_{}", i, j).into_bytes();
                mt.put(key, value).unwrap();
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 100);
}
