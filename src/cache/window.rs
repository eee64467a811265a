//! Window LRU
//!
//! Small recency stage every new item enters first. When full, the least
//! recently used item is pushed out and becomes a candidate for the main
//! cache.

use std::collections::HashMap;

use super::list::{Chain, Slab};
use super::{Stage, StoreItem};

pub(crate) struct WindowLru {
    cap: usize,
    chain: Chain,
}

impl WindowLru {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap,
            chain: Chain::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.chain.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    /// Add `item` at the front
    ///
    /// With spare room nothing is evicted. Otherwise the tail slot is reused
    /// for `item` and the tail's previous content is returned.
    pub(crate) fn add<V>(
        &mut self,
        slab: &mut Slab<StoreItem<V>>,
        data: &mut HashMap<u64, usize>,
        mut item: StoreItem<V>,
    ) -> Option<StoreItem<V>> {
        item.stage = Stage::Window;
        let key_hash = item.key_hash;

        if self.len() < self.cap {
            let idx = slab.insert(item);
            self.chain.push_front(slab, idx);
            data.insert(key_hash, idx);
            return None;
        }

        let Some(idx) = self.chain.back() else {
            return Some(item);
        };
        let evicted = slab.replace(idx, item)?;
        data.remove(&evicted.key_hash);
        data.insert(key_hash, idx);
        self.chain.move_to_front(slab, idx);

        Some(evicted)
    }

    /// Refresh recency after a hit
    pub(crate) fn touch<V>(&mut self, slab: &mut Slab<StoreItem<V>>, idx: usize) {
        self.chain.move_to_front(slab, idx);
    }

    pub(crate) fn unlink<V>(&mut self, slab: &mut Slab<StoreItem<V>>, idx: usize) {
        self.chain.unlink(slab, idx);
    }

    #[cfg(test)]
    pub(crate) fn key_hashes<V>(&self, slab: &Slab<StoreItem<V>>) -> Vec<u64> {
        self.chain
            .indices(slab)
            .filter_map(|idx| slab.get(idx).map(|item| item.key_hash))
            .collect()
    }
}
