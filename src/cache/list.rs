//! Index-linked LRU lists
//!
//! All cache stages share one `Slab` of slots. A `Chain` is just a
//! head/tail/len header threading a doubly linked list through slot indices,
//! so an item moves between stages by relinking its slot, and its index
//! (the position stored in the cache's hash table) never changes.

/// Storage for list items, addressed by stable indices
pub(crate) struct Slab<T> {
    slots: Vec<Option<Link<T>>>,
    free: Vec<usize>,
}

struct Link<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> Slab<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Store `item` in a free slot; the slot is not on any chain yet
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let link = Link {
            item,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(link);
                idx
            }
            None => {
                self.slots.push(Some(link));
                self.slots.len() - 1
            }
        }
    }

    /// Free a slot. It must already be unlinked from its chain.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<T> {
        let link = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(link.item)
    }

    /// Swap the item stored in a slot, keeping its links
    pub(crate) fn replace(&mut self, idx: usize, item: T) -> Option<T> {
        let link = self.link_mut(idx)?;
        Some(std::mem::replace(&mut link.item, item))
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.link(idx).map(|link| &link.item)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.link_mut(idx).map(|link| &mut link.item)
    }

    fn link(&self, idx: usize) -> Option<&Link<T>> {
        self.slots.get(idx)?.as_ref()
    }

    fn link_mut(&mut self, idx: usize) -> Option<&mut Link<T>> {
        self.slots.get_mut(idx)?.as_mut()
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(link) = self.link_mut(idx) {
            link.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(link) = self.link_mut(idx) {
            link.next = next;
        }
    }
}

/// A doubly linked list threaded through a `Slab`; front is most recent
#[derive(Debug, Default)]
pub(crate) struct Chain {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Chain {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Link an unlinked slot at the front
    pub(crate) fn push_front<T>(&mut self, slab: &mut Slab<T>, idx: usize) {
        slab.set_prev(idx, None);
        slab.set_next(idx, self.head);
        match self.head {
            Some(head) => slab.set_prev(head, Some(idx)),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    /// Detach a slot linked on this chain; the slot stays allocated
    pub(crate) fn unlink<T>(&mut self, slab: &mut Slab<T>, idx: usize) {
        let Some(link) = slab.link(idx) else {
            return;
        };
        let (prev, next) = (link.prev, link.next);

        match prev {
            Some(prev) => slab.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => slab.set_prev(next, prev),
            None => self.tail = prev,
        }

        slab.set_prev(idx, None);
        slab.set_next(idx, None);
        self.len -= 1;
    }

    pub(crate) fn move_to_front<T>(&mut self, slab: &mut Slab<T>, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(slab, idx);
        self.push_front(slab, idx);
    }

    /// Slot indices from front to back
    pub(crate) fn indices<'a, T>(&self, slab: &'a Slab<T>) -> impl Iterator<Item = usize> + 'a {
        std::iter::successors(self.head, move |&idx| slab.link(idx).and_then(|link| link.next))
    }
}
