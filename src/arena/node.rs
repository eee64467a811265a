//! Skip list node views
//!
//! A node is a plain byte region inside the arena; these types read and
//! write its fields in place.

use bytes::{Buf, BufMut};

use super::{NODE_HEADER_SIZE, OFFSET_SIZE};

const SCORE: usize = 0;
const KEY_OFFSET: usize = 8;
const KEY_LEN: usize = 12;
const VALUE_OFFSET: usize = 16;
const VALUE_LEN: usize = 20;
pub(super) const HEIGHT: usize = 24;

#[inline]
fn tower_slot(level: usize) -> usize {
    NODE_HEADER_SIZE + level * OFFSET_SIZE
}

/// Read-only view of a node
#[derive(Clone, Copy)]
pub struct Node<'a> {
    bytes: &'a [u8],
}

impl<'a> Node<'a> {
    pub(super) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub(super) fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Cached 8-byte key prefix
    pub fn score(&self) -> u64 {
        (&self.bytes[SCORE..]).get_u64_le()
    }

    pub fn key_offset(&self) -> u32 {
        (&self.bytes[KEY_OFFSET..]).get_u32_le()
    }

    pub fn key_len(&self) -> u32 {
        (&self.bytes[KEY_LEN..]).get_u32_le()
    }

    pub fn value_offset(&self) -> u32 {
        (&self.bytes[VALUE_OFFSET..]).get_u32_le()
    }

    pub fn value_len(&self) -> u32 {
        (&self.bytes[VALUE_LEN..]).get_u32_le()
    }

    /// Number of tower levels this node was allocated with
    pub fn height(&self) -> usize {
        (&self.bytes[HEIGHT..]).get_u16_le() as usize
    }

    /// Successor offset at `level`, 0 when there is none
    pub fn next(&self, level: usize) -> u32 {
        debug_assert!(level < self.height());
        (&self.bytes[tower_slot(level)..]).get_u32_le()
    }
}

/// Mutable view of a node
pub struct NodeMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> NodeMut<'a> {
    pub(super) fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn set_score(&mut self, score: u64) {
        (&mut self.bytes[SCORE..]).put_u64_le(score);
    }

    pub fn set_key(&mut self, offset: u32, len: u32) {
        (&mut self.bytes[KEY_OFFSET..]).put_u32_le(offset);
        (&mut self.bytes[KEY_LEN..]).put_u32_le(len);
    }

    /// Point the node at a new value region
    pub fn set_value(&mut self, offset: u32, len: u32) {
        (&mut self.bytes[VALUE_OFFSET..]).put_u32_le(offset);
        (&mut self.bytes[VALUE_LEN..]).put_u32_le(len);
    }

    pub fn set_next(&mut self, level: usize, offset: u32) {
        (&mut self.bytes[tower_slot(level)..]).put_u32_le(offset);
    }

    pub fn as_node(&self) -> Node<'_> {
        Node::new(&self.bytes[..])
    }
}
