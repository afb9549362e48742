use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, MutexGuard};

use rand::Rng;
use tracing::debug;

use crate::config::SkipListConfig;
use crate::error::{Result, SkipListError};
use crate::node::Node;

/// Result of a successful [`ConcurrentSkipList::upsert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No observable node held the key; a new node was linked in.
    Created,
    /// An existing node's value was replaced in place.
    Updated,
}

impl UpsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Predecessors and successors of a key at every level.
struct Search<K, V> {
    /// Highest level at which a node with the key was seen.
    found: Option<usize>,
    preds: Vec<Arc<Node<K, V>>>,
    succs: Vec<Arc<Node<K, V>>>,
}

/// A concurrent ordered map with lock-free reads and per-node write locks.
///
/// Keys must sort strictly above `K::default()`, which acts as the reserved
/// lower bound (the empty string for `String` keys). Values are stored
/// behind `Arc` and replaced as a whole, so a reader holding an `Arc<V>`
/// never observes a half-written value.
///
/// Every successful upsert or remove bumps a version counter exactly once;
/// [`query`](Self::query) uses it to detect structural change mid-scan.
pub struct ConcurrentSkipList<K, V> {
    head: Arc<Node<K, V>>,
    tail: Arc<Node<K, V>>,
    max_level: usize,
    version: AtomicU64,
}

impl<K: Ord + Default, V> ConcurrentSkipList<K, V> {
    /// Create an empty list with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SkipListConfig::default())
    }

    /// Create an empty list with the given configuration.
    pub fn with_config(config: SkipListConfig) -> Self {
        let max_level = config.max_level.max(1);
        let tail = Node::tail();
        let head = Node::head(max_level, &tail);
        Self {
            head,
            tail,
            max_level,
            version: AtomicU64::new(0),
        }
    }

    /// Current structural version.
    pub fn version(&self) -> u64 {
        self.version.load(AtomicOrdering::Acquire)
    }

    fn check_key(key: &K) -> Result<()> {
        if *key <= K::default() {
            return Err(SkipListError::InvalidKey);
        }
        Ok(())
    }

    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 0;
        while level < self.max_level - 1 && rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    fn search(&self, key: &K) -> Search<K, V> {
        let mut found = None;
        let mut preds = vec![Arc::clone(&self.head); self.max_level];
        let mut succs = vec![Arc::clone(&self.tail); self.max_level];
        let mut pred = Arc::clone(&self.head);
        for level in (0..self.max_level).rev() {
            let mut curr = pred.next(level);
            while curr.cmp_key(key) == Ordering::Less {
                pred = curr;
                curr = pred.next(level);
            }
            if found.is_none() && curr.cmp_key(key) == Ordering::Equal {
                found = Some(level);
            }
            preds[level] = Arc::clone(&pred);
            succs[level] = curr;
        }
        Search {
            found,
            preds,
            succs,
        }
    }

    /// Lock the distinct predecessors on levels `0..=top_level`, bottom-up,
    /// checking `adjacent(level, pred)` after each lock.
    ///
    /// Returns `None` (with every lock released) when validation fails.
    fn lock_predecessors<'a>(
        preds: &'a [Arc<Node<K, V>>],
        top_level: usize,
        mut adjacent: impl FnMut(usize, &Node<K, V>) -> bool,
    ) -> Result<Option<Vec<MutexGuard<'a, ()>>>> {
        let mut guards = Vec::with_capacity(top_level + 1);
        let mut previous: Option<&Arc<Node<K, V>>> = None;
        for (level, pred) in preds.iter().enumerate().take(top_level + 1) {
            if previous.map_or(true, |p| !Arc::ptr_eq(p, pred)) {
                guards.push(pred.lock()?);
                previous = Some(pred);
            }
            if pred.is_marked() || !adjacent(level, pred) {
                return Ok(None);
            }
        }
        Ok(Some(guards))
    }

    /// Look up `key`. Never blocks.
    pub fn find(&self, key: &K) -> Option<Arc<V>> {
        let mut pred = Arc::clone(&self.head);
        for level in (0..self.max_level).rev() {
            let mut curr = pred.next(level);
            while curr.cmp_key(key) == Ordering::Less {
                pred = curr;
                curr = pred.next(level);
            }
            if curr.cmp_key(key) == Ordering::Equal {
                if curr.is_observable() {
                    return curr.value();
                }
                return None;
            }
        }
        None
    }

    /// Returns `true` if an observable entry holds `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Insert or update `key`.
    ///
    /// `update` receives the key and the current value (`None` when the key
    /// is absent) and returns the value to store. It runs exactly once, after
    /// the list has settled whether this call creates or updates, and while
    /// the affected node locks are held, so it must stay short. If it fails
    /// the list is left untouched and the error is returned.
    ///
    /// Racing upserts of the same new key resolve to a single node: the
    /// losers observe the winner's node and are folded into updates.
    pub fn upsert<F, E>(&self, key: K, update: F) -> std::result::Result<UpsertOutcome, E>
    where
        F: FnOnce(&K, Option<&V>) -> std::result::Result<V, E>,
        E: From<SkipListError>,
    {
        Self::check_key(&key)?;
        loop {
            let search = self.search(&key);

            if let Some(level) = search.found {
                let node = &search.succs[level];
                if node.is_marked() {
                    // Being removed; wait for the unlink and insert afresh.
                    std::thread::yield_now();
                    continue;
                }
                while !node.is_fully_linked() {
                    std::thread::yield_now();
                }
                let _guard = node.lock()?;
                if node.is_marked() {
                    continue;
                }
                let current = node.value();
                let value = update(&key, current.as_deref())?;
                node.store_value(value);
                self.version.fetch_add(1, AtomicOrdering::AcqRel);
                debug!(level = node.top_level, "skip list entry updated");
                return Ok(UpsertOutcome::Updated);
            }

            let top_level = self.random_level();
            let succs = &search.succs;
            let locked = Self::lock_predecessors(&search.preds, top_level, |level, pred| {
                let succ = &succs[level];
                !succ.is_marked() && Arc::ptr_eq(&pred.next(level), succ)
            })?;
            let Some(guards) = locked else {
                debug!(top_level, "skip list insert lost a race, retrying");
                continue;
            };

            let value = update(&key, None)?;
            let node = Node::entry(key, value, top_level, &search.succs);
            for level in 0..=top_level {
                search.preds[level].set_next(level, Arc::clone(&node));
            }
            node.set_fully_linked();
            self.version.fetch_add(1, AtomicOrdering::AcqRel);
            drop(guards);
            debug!(top_level, "skip list entry linked");
            return Ok(UpsertOutcome::Created);
        }
    }

    /// Insert or overwrite `key` with `value`.
    pub fn put(&self, key: K, value: V) -> Result<UpsertOutcome> {
        self.upsert(key, |_, _| Ok::<_, SkipListError>(value))
    }

    /// Remove `key`, returning its last value.
    ///
    /// Returns `Ok(None)` when the key is absent, not yet fully linked, or
    /// already claimed by a racing remove. In that case the list is left
    /// untouched and the version does not change.
    pub fn remove(&self, key: &K) -> Result<Option<Arc<V>>> {
        let victim = {
            let search = self.search(key);
            let Some(level) = search.found else {
                return Ok(None);
            };
            let node = &search.succs[level];
            if !node.is_fully_linked() || node.top_level != level || node.is_marked() {
                return Ok(None);
            }
            Arc::clone(node)
        };

        let victim_guard = victim.lock()?;
        if victim.is_marked() {
            return Ok(None);
        }
        victim.mark();

        // The victim stays locked and marked across retries: no other
        // writer can claim it, and inserts of the same key wait for it.
        loop {
            let search = self.search(key);
            let locked = Self::lock_predecessors(&search.preds, victim.top_level, |level, pred| {
                Arc::ptr_eq(&pred.next(level), &victim)
            })?;
            let Some(guards) = locked else {
                debug!(top_level = victim.top_level, "skip list remove lost a race, retrying");
                continue;
            };

            for level in (0..=victim.top_level).rev() {
                search.preds[level].set_next(level, victim.next(level));
            }
            self.version.fetch_add(1, AtomicOrdering::AcqRel);
            drop(guards);
            drop(victim_guard);
            debug!(top_level = victim.top_level, "skip list entry unlinked");
            return Ok(victim.value());
        }
    }

    /// Number of observable entries at the moment of a level-0 walk.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut curr = self.head.next(0);
        while !curr.is_tail() {
            if curr.is_observable() {
                count += 1;
            }
            curr = curr.next(0);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord + Default + Clone, V> ConcurrentSkipList<K, V> {
    /// Every observable entry with `start <= key <= end`, in ascending order.
    ///
    /// `None` bounds are open. The scan is optimistic: the version counter
    /// is read before and after the level-0 walk, and the walk restarts if
    /// any upsert or remove completed in between. Writers are never blocked.
    pub fn query(&self, start: Option<&K>, end: Option<&K>) -> Vec<(K, Arc<V>)> {
        loop {
            let before = self.version();
            let mut entries = Vec::new();

            let mut curr = match start {
                Some(start) => self.search(start).preds[0].next(0),
                None => self.head.next(0),
            };
            while let Some(key) = curr.key() {
                if end.is_some_and(|end| key > end) {
                    break;
                }
                let in_range = start.map_or(true, |start| key >= start);
                if in_range && curr.is_observable() {
                    if let Some(value) = curr.value() {
                        entries.push((key.clone(), value));
                    }
                }
                curr = curr.next(0);
            }

            if self.version() == before {
                return entries;
            }
            debug!(before, "skip list changed during scan, retrying");
        }
    }

    /// Every observable key in ascending order.
    pub fn keys(&self) -> Vec<K> {
        self.query(None, None).into_iter().map(|(k, _)| k).collect()
    }
}

impl<K: Ord + Default, V> Default for ConcurrentSkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for ConcurrentSkipList<K, V> {
    fn drop(&mut self) {
        // Unchain iteratively; dropping a long level-0 chain recursively
        // would overflow the stack.
        let mut curr = Some(Arc::clone(&self.head));
        while let Some(node) = curr {
            curr = node.detach(&self.tail);
        }
    }
}
