//! # lsmkit
//!
//! The in-memory core of an LSM storage engine:
//! - Growable arena handing out offsets instead of pointers
//! - Arena-backed skip list used as the memtable
//! - Window + segmented LRU admission cache with frequency-based admission
//!
//! ## Architecture Overview
//!
//! ```text
//!                 get                          put / delete
//!                  │                                │
//! ┌────────────────▼────────────┐                   │
//! │       Admission Cache       │◄── invalidate ────┤
//! │ Window → Probation/Protected│                   │
//! └────────────────┬────────────┘                   │
//!              miss│                                │
//! ┌────────────────▼────────────────────────────────▼──┐
//! │                     MemTable                       │
//! │               (skip list, RwLock)                  │
//! └────────────────────────┬───────────────────────────┘
//!                          │ offsets
//!                  ┌───────▼───────┐
//!                  │     Arena     │
//!                  │  (bump alloc) │
//!                  └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod arena;
pub mod memtable;
pub mod cache;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LsmError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lsmkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
