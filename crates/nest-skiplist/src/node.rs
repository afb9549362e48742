use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;

use crate::error::{Result, SkipListError};

/// What a node holds: one of the two sentinels, or a real entry.
///
/// The variant order gives the sentinel ordering for free:
/// `Head < Entry(_) < Tail` for every key.
pub(crate) enum Slot<K, V> {
    Head,
    Entry { key: K, value: ArcSwap<V> },
    Tail,
}

/// A tower in the skip list.
///
/// `next` has one slot per level `0..=top_level`; the tail sentinel has none.
/// The mutex guards linkage changes only. Values are swapped atomically and
/// read without locking.
pub(crate) struct Node<K, V> {
    pub(crate) slot: Slot<K, V>,
    pub(crate) top_level: usize,
    next: Vec<ArcSwap<Node<K, V>>>,
    lock: Mutex<()>,
    marked: AtomicBool,
    fully_linked: AtomicBool,
}

impl<K, V> Node<K, V> {
    pub(crate) fn tail() -> Arc<Self> {
        Arc::new(Self {
            slot: Slot::Tail,
            top_level: 0,
            next: Vec::new(),
            lock: Mutex::new(()),
            marked: AtomicBool::new(false),
            fully_linked: AtomicBool::new(true),
        })
    }

    pub(crate) fn head(max_level: usize, tail: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            slot: Slot::Head,
            top_level: max_level - 1,
            next: (0..max_level).map(|_| ArcSwap::new(Arc::clone(tail))).collect(),
            lock: Mutex::new(()),
            marked: AtomicBool::new(false),
            fully_linked: AtomicBool::new(true),
        })
    }

    /// A new, not yet linked entry whose forward pointers already aim at
    /// `succs[0..=top_level]`.
    pub(crate) fn entry(key: K, value: V, top_level: usize, succs: &[Arc<Self>]) -> Arc<Self> {
        Arc::new(Self {
            slot: Slot::Entry {
                key,
                value: ArcSwap::from_pointee(value),
            },
            top_level,
            next: succs[..=top_level]
                .iter()
                .map(|succ| ArcSwap::new(Arc::clone(succ)))
                .collect(),
            lock: Mutex::new(()),
            marked: AtomicBool::new(false),
            fully_linked: AtomicBool::new(false),
        })
    }

    pub(crate) fn key(&self) -> Option<&K> {
        match &self.slot {
            Slot::Entry { key, .. } => Some(key),
            _ => None,
        }
    }

    pub(crate) fn is_tail(&self) -> bool {
        matches!(self.slot, Slot::Tail)
    }

    pub(crate) fn next(&self, level: usize) -> Arc<Self> {
        self.next[level].load_full()
    }

    pub(crate) fn set_next(&self, level: usize, node: Arc<Self>) {
        self.next[level].store(node);
    }

    /// Breaks every forward link by pointing it at `tail`.
    pub(crate) fn detach(&self, tail: &Arc<Self>) -> Option<Arc<Self>> {
        let first = self.next.first().map(ArcSwap::load_full);
        for slot in &self.next {
            slot.store(Arc::clone(tail));
        }
        first
    }

    pub(crate) fn value(&self) -> Option<Arc<V>> {
        match &self.slot {
            Slot::Entry { value, .. } => Some(value.load_full()),
            _ => None,
        }
    }

    pub(crate) fn store_value(&self, new: V) {
        if let Slot::Entry { value, .. } = &self.slot {
            value.store(Arc::new(new));
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| SkipListError::Poisoned)
    }

    pub(crate) fn is_marked(&self) -> bool {
        self.marked.load(AtomicOrdering::Acquire)
    }

    pub(crate) fn mark(&self) {
        self.marked.store(true, AtomicOrdering::Release);
    }

    pub(crate) fn is_fully_linked(&self) -> bool {
        self.fully_linked.load(AtomicOrdering::Acquire)
    }

    pub(crate) fn set_fully_linked(&self) {
        self.fully_linked.store(true, AtomicOrdering::Release);
    }

    /// Visible to readers: linked at every level and not logically deleted.
    pub(crate) fn is_observable(&self) -> bool {
        self.is_fully_linked() && !self.is_marked()
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Position of this node relative to `key`.
    pub(crate) fn cmp_key(&self, key: &K) -> Ordering {
        match &self.slot {
            Slot::Head => Ordering::Less,
            Slot::Entry { key: own, .. } => own.cmp(key),
            Slot::Tail => Ordering::Greater,
        }
    }
}
