//! Count-min sketch
//!
//! Approximate access frequencies for the admission policy. Four rows of
//! 4-bit saturating counters; the estimate is the minimum over rows, so it
//! may overcount on collisions but never undercounts. `reset` halves every
//! counter so old popularity fades.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const DEPTH: usize = 4;

/// Counters saturate at 15
const MAX_COUNT: u8 = 0x0f;

pub(crate) struct CmSketch {
    rows: [CmRow; DEPTH],
    seeds: [u64; DEPTH],
    mask: u64,
}

impl CmSketch {
    /// Sketch with `counters` counters per row, rounded up to a power of two
    pub(crate) fn new(counters: usize, seed: u64) -> Self {
        let counters = counters.max(16).next_power_of_two();
        let mut rng = StdRng::seed_from_u64(seed);

        Self {
            rows: std::array::from_fn(|_| CmRow::new(counters)),
            seeds: std::array::from_fn(|_| rng.next_u64()),
            mask: counters as u64 - 1,
        }
    }

    pub(crate) fn increment(&mut self, hash: u64) {
        for (row, &seed) in self.rows.iter_mut().zip(&self.seeds) {
            row.increment(Self::index(hash, seed, self.mask));
        }
    }

    pub(crate) fn estimate(&self, hash: u64) -> u64 {
        self.rows
            .iter()
            .zip(&self.seeds)
            .map(|(row, &seed)| row.get(Self::index(hash, seed, self.mask)))
            .min()
            .unwrap_or(0) as u64
    }

    /// Halve every counter
    pub(crate) fn reset(&mut self) {
        for row in &mut self.rows {
            row.reset();
        }
    }

    /// Mix per row so rows collide on different keys
    fn index(hash: u64, seed: u64, mask: u64) -> usize {
        let mixed = (hash ^ seed).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        ((mixed ^ (mixed >> 32)) & mask) as usize
    }
}

/// Two 4-bit counters per byte
struct CmRow(Vec<u8>);

impl CmRow {
    fn new(counters: usize) -> Self {
        Self(vec![0; counters / 2])
    }

    fn get(&self, n: usize) -> u8 {
        (self.0[n / 2] >> ((n & 1) * 4)) & MAX_COUNT
    }

    fn increment(&mut self, n: usize) {
        let shift = (n & 1) * 4;
        let count = (self.0[n / 2] >> shift) & MAX_COUNT;
        if count < MAX_COUNT {
            self.0[n / 2] += 1 << shift;
        }
    }

    fn reset(&mut self) {
        for byte in &mut self.0 {
            *byte = (*byte >> 1) & 0x77;
        }
    }
}
