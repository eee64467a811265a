//! Admission Cache Tests
//!
//! Tests verify:
//! - Get / set / remove semantics
//! - Stage movement: window, probation, protected
//! - Admission of window candidates against the probation tail
//! - Capacity bounds and stage sizing
//! - Hit/miss statistics

use std::sync::Arc;
use std::thread;

use lsmkit::cache::{key_to_hash, Cache, Stage};

// =============================================================================
// Helper Functions
// =============================================================================

/// One window slot, one probation slot, one protected slot
fn tiny_cache() -> Cache<String> {
    Cache::with_shares(3, 1, 50, 42)
}

fn key(i: usize) -> Vec<u8> {
    format!("key{:05}", i).into_bytes()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_get_missing() {
    let cache: Cache<u32> = Cache::new(16);
    assert_eq!(cache.get(b"nothing"), None);
    assert!(cache.is_empty());
}

#[test]
fn test_set_then_get() {
    let cache = Cache::new(16);

    assert!(cache.set(b"a", 1u32).is_none());

    assert_eq!(cache.get(b"a"), Some(1));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_set_overwrites_in_place() {
    let cache = Cache::new(16);

    cache.set(b"a", "v1".to_string());
    assert!(cache.set(b"a", "v2".to_string()).is_none());

    assert_eq!(cache.get(b"a"), Some("v2".to_string()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_remove() {
    let cache = Cache::new(16);
    cache.set(b"a", 1u32);

    assert_eq!(cache.remove(b"a"), Some(1));
    assert_eq!(cache.remove(b"a"), None);
    assert_eq!(cache.get(b"a"), None);
    assert!(cache.is_empty());
}

#[test]
fn test_remove_from_main_cache() {
    let cache = Cache::new(100);
    cache.set(b"a", 1u32);
    cache.set(b"b", 2u32);
    assert_eq!(cache.stage_of(b"a"), Some(Stage::Probation));

    assert_eq!(cache.remove(b"a"), Some(1));
    assert_eq!(cache.stage_of(b"a"), None);
    assert_eq!(cache.get(b"b"), Some(2));
}

#[test]
fn test_key_hashes_are_stable() {
    assert_eq!(key_to_hash(b"abc"), key_to_hash(b"abc"));
    assert_ne!(key_to_hash(b"abc").0, key_to_hash(b"abd").0);
}

// =============================================================================
// Stage Movement Tests
// =============================================================================

#[test]
fn test_new_items_enter_window() {
    let cache = Cache::new(100);
    cache.set(b"a", 1u32);
    assert_eq!(cache.stage_of(b"a"), Some(Stage::Window));
}

#[test]
fn test_window_overflow_moves_to_probation() {
    let cache = Cache::new(100);

    cache.set(b"a", 1u32);
    cache.set(b"b", 2u32);

    assert_eq!(cache.stage_of(b"a"), Some(Stage::Probation));
    assert_eq!(cache.stage_of(b"b"), Some(Stage::Window));
}

#[test]
fn test_probation_hit_promotes_to_protected() {
    let cache = Cache::new(100);
    cache.set(b"a", 1u32);
    cache.set(b"b", 2u32);

    assert_eq!(cache.get(b"a"), Some(1));
    assert_eq!(cache.stage_of(b"a"), Some(Stage::Protected));

    // Further hits keep it protected
    assert_eq!(cache.get(b"a"), Some(1));
    assert_eq!(cache.stage_of(b"a"), Some(Stage::Protected));
}

#[test]
fn test_window_hit_stays_in_window() {
    let cache = Cache::new(100);
    cache.set(b"a", 1u32);

    assert_eq!(cache.get(b"a"), Some(1));
    assert_eq!(cache.stage_of(b"a"), Some(Stage::Window));
}

// =============================================================================
// Admission Tests
// =============================================================================

#[test]
fn test_unread_candidate_ties_with_unread_tail() {
    let cache = tiny_cache();

    cache.set(b"k1", "v1".to_string());
    cache.set(b"k2", "v2".to_string());
    cache.set(b"k3", "v3".to_string());
    // k1 and k2 fill the main cache, k3 sits in the window
    assert_eq!(cache.len(), 3);

    // Neither k3 nor the probation tail k1 was ever read: a tie admits k3
    let evicted = cache.set(b"k4", "v4".to_string()).unwrap();
    assert_eq!(evicted.value, "v1");
    assert_eq!(evicted.key_hash, key_to_hash(b"k1").0);

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.stage_of(b"k1"), None);
    assert_eq!(cache.stage_of(b"k3"), Some(Stage::Probation));
    assert_eq!(cache.stage_of(b"k4"), Some(Stage::Window));
}

#[test]
fn test_equal_read_counts_admit_candidate() {
    let cache = tiny_cache();

    cache.set(b"k1", "v1".to_string());
    assert_eq!(cache.get(b"k1"), Some("v1".to_string()));
    cache.set(b"k2", "v2".to_string());
    cache.set(b"k3", "v3".to_string());
    assert_eq!(cache.get(b"k3"), Some("v3".to_string()));

    // k3 and the probation tail k1 were each read once
    let evicted = cache.set(b"k4", "v4".to_string()).unwrap();
    assert_eq!(evicted.value, "v1");
    assert_eq!(cache.stage_of(b"k3"), Some(Stage::Probation));
    assert_eq!(cache.stage_of(b"k2"), Some(Stage::Probation));
}

#[test]
fn test_cold_candidate_loses_to_frequent_tail() {
    let cache = tiny_cache();

    cache.set(b"k1", "v1".to_string());
    cache.get(b"k1");
    cache.get(b"k1");
    cache.set(b"k2", "v2".to_string());
    cache.set(b"k3", "v3".to_string());

    // k1 is the probation tail and was read twice, k3 never
    let evicted = cache.set(b"k4", "v4".to_string()).unwrap();
    assert_eq!(evicted.value, "v3");
    assert_eq!(evicted.key_hash, key_to_hash(b"k3").0);

    assert_eq!(cache.stage_of(b"k3"), None);
    assert_eq!(cache.stage_of(b"k1"), Some(Stage::Probation));
}

#[test]
fn test_frequency_survives_aging() {
    // Aging runs every 10 × 3 = 30 reads
    let cache = tiny_cache();

    cache.set(b"a", "a".to_string());
    cache.set(b"b", "b".to_string());
    cache.set(b"c", "c".to_string());

    for _ in 0..15 {
        assert_eq!(cache.get(b"c"), Some("c".to_string()));
    }
    // The 30th read ages the estimates and clears the doorkeeper
    for _ in 0..15 {
        assert_eq!(cache.get(b"missing"), None);
    }

    // c keeps a halved count and still beats the never-read tail a
    let evicted = cache.set(b"d", "d".to_string()).unwrap();
    assert_eq!(evicted.value, "a");
    assert_eq!(cache.stage_of(b"c"), Some(Stage::Probation));
    assert_eq!(cache.get(b"c"), Some("c".to_string()));
}

#[test]
fn test_frequent_candidate_displaces_probation_tail() {
    let cache = tiny_cache();

    cache.set(b"k1", "v1".to_string());
    cache.set(b"k2", "v2".to_string());
    cache.set(b"k3", "v3".to_string());

    // Make k3 popular while it is still in the window
    for _ in 0..3 {
        assert_eq!(cache.get(b"k3"), Some("v3".to_string()));
    }

    // k1 is the probation tail and was never read
    let evicted = cache.set(b"k4", "v4".to_string()).unwrap();
    assert_eq!(evicted.value, "v1");

    assert_eq!(cache.stage_of(b"k1"), None);
    assert_eq!(cache.stage_of(b"k3"), Some(Stage::Probation));
    assert_eq!(cache.get(b"k3"), Some("v3".to_string()));
}

#[test]
fn test_protected_entry_survives_scan() {
    let cache = Cache::new(100);

    cache.set(b"hot", 0usize);
    cache.set(b"filler", 0usize);
    cache.get(b"hot");
    assert_eq!(cache.stage_of(b"hot"), Some(Stage::Protected));

    for i in 0..1_000 {
        cache.set(&key(i), i);
    }

    assert_eq!(cache.get(b"hot"), Some(0));
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_len_never_exceeds_capacity() {
    let cache = Cache::new(64);

    for i in 0..1_000 {
        cache.set(&key(i), i);
        if i % 3 == 0 {
            cache.get(&key(i / 2));
        }
        assert!(cache.len() <= cache.capacity());
    }
    assert_eq!(cache.len(), cache.capacity());
}

#[test]
fn test_every_insert_beyond_capacity_evicts_one() {
    let cache = Cache::new(32);
    let mut evictions = 0;

    for i in 0..500 {
        if cache.set(&key(i), i).is_some() {
            evictions += 1;
        }
    }

    assert_eq!(cache.len() + evictions, 500);
}

#[test]
fn test_capacity_matches_request() {
    assert_eq!(Cache::<u8>::with_shares(1_000, 1, 20, 0).capacity(), 1_000);
    assert_eq!(Cache::<u8>::with_shares(10, 50, 50, 0).capacity(), 10);
    assert_eq!(Cache::<u8>::new(1024).capacity(), 1024);
}

#[test]
fn test_tiny_capacity_is_raised() {
    assert_eq!(Cache::<u8>::new(0).capacity(), 3);
    assert_eq!(Cache::<u8>::new(1).capacity(), 3);
}

// =============================================================================
// Statistics Tests
// =============================================================================

#[test]
fn test_stats_count_hits_and_misses() {
    let cache = Cache::new(16);

    cache.get(b"a");
    cache.set(b"a", 1u32);
    cache.get(b"a");
    cache.get(b"a");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_hit_ratio_without_reads() {
    let cache: Cache<u32> = Cache::new(16);
    assert_eq!(cache.stats().hit_ratio(), 0.0);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_set_and_get() {
    let cache = Arc::new(Cache::new(128));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500 {
                    let k = key((t * 31 + i) % 300);
                    if i % 2 == 0 {
                        cache.set(&k, i);
                    } else {
                        cache.get(&k);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= cache.capacity());
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 8 * 250);
}
