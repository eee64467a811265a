//! Arena-backed skip list
//!
//! Ordered index over entries. Nodes, keys and values live in an [`Arena`];
//! links between nodes are arena offsets.
//!
//! ## Ordering
//! Entries are ordered by `(score, key)`. The score is the first eight key
//! bytes packed big-endian into a `u64`, so most comparisons are a single
//! integer compare and the full key is only consulted when two prefixes are
//! equal. Because the packing preserves byte order, `(score, key)` order is
//! the same as plain lexicographic key order.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::trace;

use crate::arena::{Arena, Node, MAX_LEVEL};
use crate::codec::Entry;
use crate::error::{LsmError, Result};

/// Random source used to draw tower heights
pub type HeightRng = Box<dyn RngCore + Send + Sync>;

/// Sorted key/value index with unique keys
///
/// ## Concurrency:
/// - `inner`: one RwLock over arena, head and random source. Writers are
///   exclusive, so a node is fully linked before any reader can reach it.
/// - `length`, `size`: atomics, readable without the lock
pub struct SkipList {
    inner: RwLock<Inner>,

    /// Number of distinct keys
    length: AtomicUsize,

    /// Sum of key lengths and encoded value sizes
    size: AtomicUsize,

    /// Highest tower a new node may get
    max_level: usize,
}

struct Inner {
    arena: Arena,

    /// Sentinel node with a full `max_level` tower
    head: u32,

    /// Tallest tower currently linked; searches start here
    height: usize,

    rng: HeightRng,
}

/// 8-byte big-endian key prefix, zero padded
pub fn score(key: &[u8]) -> u64 {
    key.iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (56 - 8 * i))
}

fn compare(score: u64, key: &[u8], arena: &Arena, node: &Node<'_>) -> CmpOrdering {
    score
        .cmp(&node.score())
        .then_with(|| key.cmp(arena.get_key(node.key_offset(), node.key_len())))
}

fn next_of(arena: &Arena, offset: u32, level: usize) -> u32 {
    arena.get_node(offset).map_or(0, |node| node.next(level))
}

fn set_next(arena: &mut Arena, offset: u32, level: usize, next: u32) {
    if let Some(mut node) = arena.node_mut(offset) {
        node.set_next(level, next);
    }
}

impl SkipList {
    /// Create an empty list with an entropy-seeded height generator
    pub fn new(arena: Arena, max_level: usize) -> Self {
        Self::with_rng(arena, max_level, Box::new(StdRng::from_entropy()))
    }

    /// Create an empty list drawing tower heights from `rng`
    ///
    /// `max_level` is clamped to `1..=MAX_LEVEL`.
    pub fn with_rng(mut arena: Arena, max_level: usize, rng: HeightRng) -> Self {
        let max_level = max_level.clamp(1, MAX_LEVEL);
        let head = arena.put_node(max_level);

        Self {
            inner: RwLock::new(Inner {
                arena,
                head,
                height: 1,
                rng,
            }),
            length: AtomicUsize::new(0),
            size: AtomicUsize::new(0),
            max_level,
        }
    }

    /// Insert `entry`, or replace the value if its key is already present
    ///
    /// Fails with `InvalidEntry` when the key is empty.
    pub fn insert_or_update(&self, entry: Entry) -> Result<()> {
        if entry.key.is_empty() {
            return Err(LsmError::InvalidEntry);
        }

        let score = score(&entry.key);
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut preds = [inner.head; MAX_LEVEL];
        let found = Self::seek(inner, score, &entry.key, &mut preds)
            .map(|node| (inner.arena.node_offset(&node), node.value_len() as usize));

        let value_len = entry.value.encoded_size();

        // Existing key: point the node at a fresh copy of the value
        if let Some((offset, old_len)) = found {
            let value_offset = inner.arena.put_value(&entry.value);
            if let Some(mut node) = inner.arena.node_mut(offset) {
                node.set_value(value_offset, value_len as u32);
            }

            if value_len >= old_len {
                self.size.fetch_add(value_len - old_len, Ordering::AcqRel);
            } else {
                self.size.fetch_sub(old_len - value_len, Ordering::AcqRel);
            }

            trace!(offset, old_len, value_len, "Updated skip list node");
            return Ok(());
        }

        let height = random_height(inner.rng.as_mut(), self.max_level);
        let offset = inner.arena.put_node(height);
        let key_offset = inner.arena.put_key(&entry.key);
        let value_offset = inner.arena.put_value(&entry.value);

        if let Some(mut node) = inner.arena.node_mut(offset) {
            node.set_score(score);
            node.set_key(key_offset, entry.key.len() as u32);
            node.set_value(value_offset, value_len as u32);
        }

        for (level, &pred) in preds.iter().enumerate().take(height) {
            let succ = next_of(&inner.arena, pred, level);
            set_next(&mut inner.arena, offset, level, succ);
            set_next(&mut inner.arena, pred, level, offset);
        }
        inner.height = inner.height.max(height);

        self.length.fetch_add(1, Ordering::AcqRel);
        self.size.fetch_add(entry.footprint(), Ordering::AcqRel);

        trace!(offset, height, "Linked skip list node");
        Ok(())
    }

    /// Find the entry stored under `key`
    pub fn lookup(&self, key: &[u8]) -> Result<Option<Entry>> {
        if self.length.load(Ordering::Acquire) == 0 {
            return Ok(None);
        }

        let inner = self.inner.read();
        let mut preds = [0u32; MAX_LEVEL];
        let Some(node) = Self::seek(&inner, score(key), key, &mut preds) else {
            return Ok(None);
        };

        let value = inner.arena.get_value(node.value_offset(), node.value_len())?;
        Ok(Some(Entry::with_value(Bytes::copy_from_slice(key), value)))
    }

    /// All entries in ascending key order
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let inner = self.inner.read();
        let arena = &inner.arena;

        let mut entries = Vec::with_capacity(self.len());
        let mut offset = next_of(arena, inner.head, 0);
        while let Some(node) = arena.get_node(offset) {
            let key = arena.get_key(node.key_offset(), node.key_len());
            let value = arena.get_value(node.value_offset(), node.value_len())?;
            entries.push(Entry::with_value(Bytes::copy_from_slice(key), value));
            offset = node.next(0);
        }

        Ok(entries)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.length.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of keys and encoded values currently referenced
    pub fn byte_size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Bytes allocated from the backing arena, including superseded values
    pub fn arena_size(&self) -> usize {
        self.inner.read().arena.size()
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Descend from the tallest tower towards `(score, key)`
    ///
    /// Returns the node holding `key` if present. Otherwise `preds[level]` is
    /// left holding the last node strictly before `key` for every level below
    /// the current list height.
    fn seek<'a>(
        inner: &'a Inner,
        score: u64,
        key: &[u8],
        preds: &mut [u32; MAX_LEVEL],
    ) -> Option<Node<'a>> {
        let arena = &inner.arena;
        let mut prev = inner.head;

        for level in (0..inner.height).rev() {
            loop {
                let next = next_of(arena, prev, level);
                let Some(node) = arena.get_node(next) else {
                    break;
                };
                match compare(score, key, arena, &node) {
                    CmpOrdering::Greater => prev = next,
                    CmpOrdering::Equal => return Some(node),
                    CmpOrdering::Less => break,
                }
            }
            preds[level] = prev;
        }

        None
    }
}

/// Fair coin flips: each extra level has probability 1/2
fn random_height(rng: &mut (dyn RngCore + Send + Sync), max_level: usize) -> usize {
    let mut height = 1;
    while height < max_level && (rng.next_u32() & 1) == 1 {
        height += 1;
    }
    height
}
