//! Entry definition
//!
//! The unit accepted by the index: a key and its value, written together.

use bytes::Bytes;

use super::ValueStruct;

/// A key/value pair treated as one unit on insert and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Bytes,
    pub value: ValueStruct,
}

impl Entry {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: ValueStruct::new(value),
        }
    }

    /// Build an entry from an already assembled value
    pub fn with_value(key: impl Into<Bytes>, value: ValueStruct) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Footprint of this entry in the index's byte accounting
    pub fn footprint(&self) -> usize {
        self.key.len() + self.value.encoded_size()
    }
}
