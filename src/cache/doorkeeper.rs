//! Doorkeeper
//!
//! Bloom filter remembering which keys were seen since the last reset.
//! It absorbs the first read of every key, so one-hit wonders never reach
//! the frequency sketch.

use std::f64::consts::LN_2;

pub(crate) struct Doorkeeper {
    bits: Vec<u64>,
    num_bits: u64,
    hashes: u32,
}

impl Doorkeeper {
    /// Filter sized for `expected` keys at `false_positive` rate
    pub(crate) fn new(expected: usize, false_positive: f64) -> Self {
        let n = expected.max(1) as f64;
        let m = (-n * false_positive.ln() / (LN_2 * LN_2)).ceil().max(64.0);
        let k = ((m / n) * LN_2).round().clamp(1.0, 30.0);

        let words = (m as usize).div_ceil(64);
        Self {
            bits: vec![0; words],
            num_bits: (words * 64) as u64,
            hashes: k as u32,
        }
    }

    /// Record `hash`; returns whether it was already present
    pub(crate) fn allow(&mut self, hash: u64) -> bool {
        if self.contains(hash) {
            return true;
        }
        self.insert(hash);
        false
    }

    pub(crate) fn contains(&self, hash: u64) -> bool {
        self.positions(hash)
            .all(|bit| self.bits[(bit / 64) as usize] & (1 << (bit % 64)) != 0)
    }

    fn insert(&mut self, hash: u64) {
        let positions: Vec<u64> = self.positions(hash).collect();
        for bit in positions {
            self.bits[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.bits.fill(0);
    }

    /// Double hashing: h1 + i * h2
    fn positions(&self, hash: u64) -> impl Iterator<Item = u64> {
        let h1 = hash & 0xffff_ffff;
        let h2 = (hash >> 32) | 1;
        let num_bits = self.num_bits;
        (0..self.hashes as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % num_bits)
    }
}
