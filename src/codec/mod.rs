//! Codec Module
//!
//! Key/value payloads stored by the memtable and their binary encoding.
//!
//! ## Responsibilities
//! - Define the `Entry` unit written into the index
//! - Encode/decode values into arena-owned byte regions
//!
//! ## Value Format
//! ```text
//! ┌──────────┬──────────────────┬─────────────────────┐
//! │ Meta (1) │ Expires At (8)   │       Value         │
//! └──────────┴──────────────────┴─────────────────────┘
//! ```

mod entry;
mod value;

pub use entry::Entry;
pub use value::{ValueStruct, BIT_DELETE, VALUE_HEADER_SIZE};
