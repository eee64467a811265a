//! Configuration for lsmkit
//!
//! Centralized configuration with sensible defaults.

use crate::arena::MAX_LEVEL;
use crate::error::{LsmError, Result};

/// Main configuration for an lsmkit engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Arena Configuration
    // -------------------------------------------------------------------------
    /// Initial size of each memtable arena (in bytes)
    pub arena_size: usize,

    /// Whether the arena may grow past `arena_size`.
    /// When false, overflowing the arena panics.
    pub arena_grow: bool,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Highest tower a skip list node may get (1..=48)
    pub max_level: usize,

    /// Max arena footprint of a memtable before it should be flushed (in bytes)
    pub memtable_size_limit: usize,

    /// Seed for the tower height generator. `None` seeds from entropy.
    pub rng_seed: Option<u64>,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Total number of entries the admission cache holds
    pub cache_capacity: usize,

    /// Share of `cache_capacity` given to the recency window (percent)
    pub window_percent: usize,

    /// Share of the main cache given to the probation stage (percent)
    pub probation_percent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_size: 64 * 1024 * 1024, // 64 MB
            arena_grow: true,
            max_level: MAX_LEVEL,
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
            rng_seed: None,
            cache_capacity: 1024,
            window_percent: 1,
            probation_percent: 20,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every field is within its supported range
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 || self.max_level > MAX_LEVEL {
            return Err(LsmError::Config(format!(
                "max_level must be in 1..={}, got {}",
                MAX_LEVEL, self.max_level
            )));
        }
        if self.arena_size == 0 || self.arena_size > u32::MAX as usize {
            return Err(LsmError::Config(format!(
                "arena_size must be in 1..={}, got {}",
                u32::MAX,
                self.arena_size
            )));
        }
        if self.cache_capacity < 3 {
            return Err(LsmError::Config(format!(
                "cache_capacity must be at least 3, got {}",
                self.cache_capacity
            )));
        }
        if !(1..=99).contains(&self.window_percent) {
            return Err(LsmError::Config(format!(
                "window_percent must be in 1..=99, got {}",
                self.window_percent
            )));
        }
        if !(1..=99).contains(&self.probation_percent) {
            return Err(LsmError::Config(format!(
                "probation_percent must be in 1..=99, got {}",
                self.probation_percent
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the initial arena size (in bytes)
    pub fn arena_size(mut self, size: usize) -> Self {
        self.config.arena_size = size;
        self
    }

    /// Allow or forbid arena growth
    pub fn arena_grow(mut self, grow: bool) -> Self {
        self.config.arena_grow = grow;
        self
    }

    /// Set the maximum skip list level
    pub fn max_level(mut self, level: usize) -> Self {
        self.config.max_level = level;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Fix the seed of the tower height generator
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Set the cache capacity (in entries)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the window share of the cache (percent)
    pub fn window_percent(mut self, percent: usize) -> Self {
        self.config.window_percent = percent;
        self
    }

    /// Set the probation share of the main cache (percent)
    pub fn probation_percent(mut self, percent: usize) -> Self {
        self.config.probation_percent = percent;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
