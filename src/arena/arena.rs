//! Arena implementation
//!
//! A single `Vec<u8>` with a bump cursor.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, error, trace};

use crate::codec::ValueStruct;
use crate::error::Result;

use super::node::HEIGHT;
use super::{Node, NodeMut, MAX_LEVEL, MAX_NODE_SIZE, NODE_ALIGN_MASK, NODE_HEADER_SIZE, OFFSET_SIZE};

/// Largest single growth step (1 GB)
const MAX_GROW_STEP: usize = 1 << 30;

/// Growable bump allocator addressed by `u32` offsets
///
/// ## Concurrency:
/// - Every allocating method takes `&mut self`, because growth replaces
///   `buf`. The owning skip list only reaches `&mut Arena` under its write
///   lock, so allocations are serialized by that lock, growth included.
/// - `cursor`: an atomic so `size()` can be read through `&self` with
///   acquire ordering while no allocation is running
pub struct Arena {
    /// Next free offset. Starts at 1 so that 0 can mean "null".
    cursor: AtomicU32,

    /// Whether the buffer may be replaced by a larger one
    grow: bool,

    /// Backing storage, zero-filled
    buf: Vec<u8>,
}

impl Arena {
    /// Create an arena with `capacity` bytes of backing storage
    ///
    /// Offsets are `u32`, so `capacity` is clamped to `u32::MAX`.
    pub fn new(capacity: usize, grow: bool) -> Self {
        let capacity = capacity.clamp(1, u32::MAX as usize);
        debug!(capacity, grow, "Creating arena");
        Self {
            cursor: AtomicU32::new(1),
            grow,
            buf: vec![0u8; capacity],
        }
    }

    /// Current size of the backing buffer
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes handed out so far (including the reserved null byte)
    pub fn size(&self) -> usize {
        self.cursor.load(Ordering::Acquire) as usize
    }

    /// Reserve `size` bytes and return the start offset
    ///
    /// # Panics
    /// On a non-growable arena, panics when the reservation does not fit.
    /// Also panics when the `u32` offset space is exhausted.
    pub fn allocate(&mut self, size: u32) -> u32 {
        let start = self.cursor.fetch_add(size, Ordering::AcqRel);
        let end = match start.checked_add(size) {
            Some(end) => end as usize,
            None => {
                error!(start, size, "Arena offset space exhausted");
                panic!("arena offset space exhausted: start={} size={}", start, size);
            }
        };

        if !self.grow {
            if end > self.buf.len() {
                error!(
                    end,
                    capacity = self.buf.len(),
                    "Allocation exceeds non-growable arena"
                );
                panic!(
                    "arena capacity violation: need {} bytes, capacity {}",
                    end,
                    self.buf.len()
                );
            }
            return start;
        }

        // Keep at least one full node of headroom after every allocation
        if end + MAX_NODE_SIZE > self.buf.len() {
            self.grow_to_fit(end, size as usize);
        }

        trace!(start, size, "Reserved arena bytes");
        start
    }

    fn grow_to_fit(&mut self, end: usize, size: usize) {
        let old_len = self.buf.len();
        let grow_by = old_len.min(MAX_GROW_STEP).max(size);
        let new_len = (old_len + grow_by).min(u32::MAX as usize).max(end);

        debug!(old_len, new_len, "Growing arena");

        let mut new_buf = vec![0u8; new_len];
        new_buf[..old_len].copy_from_slice(&self.buf);
        self.buf = new_buf;
    }

    /// Allocate a node with `height` tower levels and return its aligned offset
    ///
    /// Tower slots above `height` are never allocated. The height field is
    /// written so the node can be viewed immediately.
    pub fn put_node(&mut self, height: usize) -> u32 {
        assert!(
            (1..=MAX_LEVEL).contains(&height),
            "node height {} out of range 1..={}",
            height,
            MAX_LEVEL
        );

        let unused = (MAX_LEVEL - height) * OFFSET_SIZE;
        let len = (MAX_NODE_SIZE - unused + NODE_ALIGN_MASK) as u32;
        let start = self.allocate(len);

        let offset = (start + NODE_ALIGN_MASK as u32) & !(NODE_ALIGN_MASK as u32);
        let at = offset as usize + HEIGHT;
        self.buf[at..at + 2].copy_from_slice(&(height as u16).to_le_bytes());
        offset
    }

    /// Copy `key` into the arena
    pub fn put_key(&mut self, key: &[u8]) -> u32 {
        let offset = self.allocate(key.len() as u32);
        let start = offset as usize;
        self.buf[start..start + key.len()].copy_from_slice(key);
        offset
    }

    /// Encode `value` into the arena
    pub fn put_value(&mut self, value: &ValueStruct) -> u32 {
        let len = value.encoded_size();
        let offset = self.allocate(len as u32);
        let start = offset as usize;
        value.encode(&mut self.buf[start..start + len]);
        offset
    }

    /// View the node at `offset`; `None` for the null offset
    pub fn get_node(&self, offset: u32) -> Option<Node<'_>> {
        let start = self.node_start(offset)?;
        let len = self.node_len(start);
        Some(Node::new(&self.buf[start..start + len]))
    }

    /// Mutable view of the node at `offset`; `None` for the null offset
    pub fn node_mut(&mut self, offset: u32) -> Option<NodeMut<'_>> {
        let start = self.node_start(offset)?;
        let len = self.node_len(start);
        Some(NodeMut::new(&mut self.buf[start..start + len]))
    }

    /// View the key bytes at `offset`
    pub fn get_key(&self, offset: u32, len: u32) -> &[u8] {
        if offset == 0 {
            return &[];
        }
        let start = offset as usize;
        &self.buf[start..start + len as usize]
    }

    /// Decode the value at `offset`
    pub fn get_value(&self, offset: u32, len: u32) -> Result<ValueStruct> {
        let start = offset as usize;
        ValueStruct::decode(&self.buf[start..start + len as usize])
    }

    /// Offset of a node view that lives inside this arena
    pub fn node_offset(&self, node: &Node<'_>) -> u32 {
        let base = self.buf.as_ptr() as usize;
        let at = node.as_ptr() as usize;
        debug_assert!(at >= base && at < base + self.buf.len());
        (at - base) as u32
    }

    fn node_start(&self, offset: u32) -> Option<usize> {
        if offset == 0 {
            return None;
        }
        Some(offset as usize)
    }

    fn node_len(&self, start: usize) -> usize {
        let height = u16::from_le_bytes([self.buf[start + HEIGHT], self.buf[start + HEIGHT + 1]]);
        NODE_HEADER_SIZE + height as usize * OFFSET_SIZE
    }
}
