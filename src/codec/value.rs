//! Value encoding
//!
//! `ValueStruct` is the value half of an entry plus its metadata.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{LsmError, Result};

/// Meta byte + big-endian expiry timestamp
pub const VALUE_HEADER_SIZE: usize = 1 + 8;

/// Meta bit marking a tombstone
pub const BIT_DELETE: u8 = 1 << 0;

/// A value payload with its metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStruct {
    /// Opaque flag bits (see [`BIT_DELETE`])
    pub meta: u8,

    /// Expiry as unix seconds, 0 for never
    pub expires_at: u64,

    /// The value bytes
    pub value: Bytes,
}

impl ValueStruct {
    /// Create a live value with no expiry
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            meta: 0,
            expires_at: 0,
            value: value.into(),
        }
    }

    /// Create a tombstone
    pub fn tombstone() -> Self {
        Self {
            meta: BIT_DELETE,
            expires_at: 0,
            value: Bytes::new(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.meta & BIT_DELETE != 0
    }

    /// Number of bytes `encode` writes
    pub fn encoded_size(&self) -> usize {
        VALUE_HEADER_SIZE + self.value.len()
    }

    /// Encode into `dest`, which must hold at least `encoded_size()` bytes
    pub fn encode(&self, mut dest: &mut [u8]) {
        dest.put_u8(self.meta);
        dest.put_u64(self.expires_at);
        dest.put_slice(&self.value);
    }

    /// Decode a value previously written by `encode`
    pub fn decode(mut src: &[u8]) -> Result<Self> {
        if src.len() < VALUE_HEADER_SIZE {
            return Err(LsmError::Codec(format!(
                "Value too short: expected at least {} bytes, got {}",
                VALUE_HEADER_SIZE,
                src.len()
            )));
        }

        let meta = src.get_u8();
        let expires_at = src.get_u64();
        let value = Bytes::copy_from_slice(src);

        Ok(Self {
            meta,
            expires_at,
            value,
        })
    }
}
