//! Error types for lsmkit
//!
//! Provides a unified error type for all fallible operations.
//!
//! Overflowing a non-growable arena is not represented here; it panics
//! (see [`crate::arena::Arena::allocate`]).

use thiserror::Error;

/// Result type alias using LsmError
pub type Result<T> = std::result::Result<T, LsmError>;

/// Unified error type for lsmkit operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LsmError {
    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Invalid entry: key must not be empty")]
    InvalidEntry,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
