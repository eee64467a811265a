//! Arena Module
//!
//! Bump allocator backing a memtable's skip list.
//!
//! ## Responsibilities
//! - Carve keys, values and skip list nodes out of one growable buffer
//! - Hand out relative `u32` offsets instead of native references
//! - Translate offsets back into views at the point of use
//!
//! ## Why offsets
//! The backing buffer is reallocated when it grows. Native references into
//! it would dangle after a grow, while an offset keeps meaning the same bytes
//! because the old contents are copied verbatim to the front of the new
//! buffer. Offset 0 is never handed out and stands for "no node".
//!
//! ## Node Layout
//! ```text
//! ┌───────────┬─────────┬─────────┬─────────┬─────────┬────────┬─────┬──────────────────┐
//! │ Score (8) │ KeyOff  │ KeyLen  │ ValOff  │ ValLen  │ Height │ pad │ Tower (4 × h)    │
//! │           │  (4)    │  (4)    │  (4)    │  (4)    │  (2)   │ (6) │                  │
//! └───────────┴─────────┴─────────┴─────────┴─────────┴────────┴─────┴──────────────────┘
//! ```
//! All integers are little-endian. Only `height` tower slots are allocated.

mod arena;
mod node;

pub use arena::Arena;
pub use node::{Node, NodeMut};

/// Size of one tower slot (a successor offset)
pub const OFFSET_SIZE: usize = std::mem::size_of::<u32>();

/// Structural maximum tower height
pub const MAX_LEVEL: usize = 48;

/// Fixed part of a node, before the tower
pub const NODE_HEADER_SIZE: usize = 32;

/// Mask rounding an offset up to the 8-byte boundary a node starts on.
/// Also the most padding a node allocation needs to reach that boundary.
pub(crate) const NODE_ALIGN_MASK: usize = std::mem::size_of::<u64>() - 1;

/// Size of a node with a full tower
pub const MAX_NODE_SIZE: usize = NODE_HEADER_SIZE + MAX_LEVEL * OFFSET_SIZE;
