//! Segmented LRU
//!
//! Main cache stage, split into probation and protected segments. Items are
//! admitted into probation; a second access promotes them into protected,
//! where one-off accesses cannot push them out.

use std::collections::HashMap;

use super::list::{Chain, Slab};
use super::{Stage, StoreItem};

pub(crate) struct SegmentedLru {
    probation_cap: usize,
    protected_cap: usize,
    probation: Chain,
    protected: Chain,
}

impl SegmentedLru {
    pub(crate) fn new(probation_cap: usize, protected_cap: usize) -> Self {
        Self {
            probation_cap,
            protected_cap,
            probation: Chain::default(),
            protected: Chain::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.probation.len() + self.protected.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.probation_cap + self.protected_cap
    }

    /// Add `item` at the front of probation
    ///
    /// Probation may borrow protected's unused room. Once the whole segment
    /// is full, the probation tail's slot is reused for `item` and the tail's
    /// previous content is returned.
    pub(crate) fn add<V>(
        &mut self,
        slab: &mut Slab<StoreItem<V>>,
        data: &mut HashMap<u64, usize>,
        mut item: StoreItem<V>,
    ) -> Option<StoreItem<V>> {
        item.stage = Stage::Probation;
        let key_hash = item.key_hash;

        if self.probation.len() < self.probation_cap || self.len() < self.capacity() {
            let idx = slab.insert(item);
            self.probation.push_front(slab, idx);
            data.insert(key_hash, idx);
            return None;
        }

        let Some(idx) = self.probation.back() else {
            return Some(item);
        };
        let evicted = slab.replace(idx, item)?;
        data.remove(&evicted.key_hash);
        data.insert(key_hash, idx);
        self.probation.move_to_front(slab, idx);

        Some(evicted)
    }

    /// The item that `add` would evict next, if the segment is full
    pub(crate) fn victim<'a, V>(&self, slab: &'a Slab<StoreItem<V>>) -> Option<&'a StoreItem<V>> {
        if self.len() < self.capacity() {
            return None;
        }
        self.probation.back().and_then(|idx| slab.get(idx))
    }

    /// Record a hit on the item in slot `idx`
    ///
    /// Protected items move to the front of protected. Probation items are
    /// promoted to the front of protected; if that overfills protected, its
    /// tail is demoted to the front of probation.
    pub(crate) fn get<V>(&mut self, slab: &mut Slab<StoreItem<V>>, idx: usize) {
        let Some(item) = slab.get_mut(idx) else {
            return;
        };

        if item.stage == Stage::Protected {
            self.protected.move_to_front(slab, idx);
            return;
        }

        item.stage = Stage::Protected;
        self.probation.unlink(slab, idx);
        self.protected.push_front(slab, idx);

        if self.protected.len() > self.protected_cap {
            if let Some(tail) = self.protected.back() {
                self.protected.unlink(slab, tail);
                if let Some(demoted) = slab.get_mut(tail) {
                    demoted.stage = Stage::Probation;
                }
                self.probation.push_front(slab, tail);
            }
        }
    }

    /// Detach the item in slot `idx` from whichever segment holds it
    pub(crate) fn unlink<V>(&mut self, slab: &mut Slab<StoreItem<V>>, idx: usize) {
        match slab.get(idx).map(|item| item.stage) {
            Some(Stage::Probation) => self.probation.unlink(slab, idx),
            Some(Stage::Protected) => self.protected.unlink(slab, idx),
            _ => {}
        }
    }

    #[cfg(test)]
    fn key_hashes<V>(chain: &Chain, slab: &Slab<StoreItem<V>>) -> Vec<u64> {
        chain
            .indices(slab)
            .filter_map(|idx| slab.get(idx).map(|item| item.key_hash))
            .collect()
    }
}
