//! Engine integration tests
