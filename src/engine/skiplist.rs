//! SKIPTTL - Skip List Engine
//! The ordered multi-level linked structure and its TTL semantics.
//!
//! ## Layout
//! ```text
//! Level 2:  HEAD ──────────────────► 30 ─────────────────► NIL
//! Level 1:  HEAD ──────► 10 ───────► 30 ──────► 50 ──────► NIL
//! Level 0:  HEAD ──► 5 ► 10 ──► 20 ► 30 ──► 40 ► 50 ──► 60 ► NIL
//! ```
//! The header is a row of `max_level` slots owned by the list. Nodes live
//! in a [`NodeArena`] and link to each other with [`NodeId`] handles; a
//! `None` predecessor in the descent bookkeeping stands for the header.
//!
//! ## Expiry
//! Lookups treat an expired entry as absent but never remove it.
//! Removal happens through erase or one of the two sweeps, which the
//! caller schedules.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{Config, DEFAULT_MAX_LEVEL};
use crate::error::{Result, SkipListError};
use crate::types::{Entry, NodeId};

use super::dump::Dump;
use super::iter::{level0_ids, Iter};
use super::level::LevelGenerator;
use super::metrics::EngineMetrics;
use super::node::{Node, NodeArena};
use super::ttl::Expiry;

/// Predecessor at one level; `None` is the header.
type Link = Option<NodeId>;

/// In-memory ordered key-value container with per-entry TTL.
///
/// ## Example
/// ```
/// use skipttl::engine::SkipList;
///
/// let mut list: SkipList<i32, &str> = SkipList::new(4).unwrap();
/// list.insert(2, "two").unwrap();
/// list.insert(1, "one").unwrap();
///
/// assert_eq!(list.search(&2), Some(&"two"));
/// assert!(list.erase(&2));
/// assert_eq!(list.search(&2), None);
/// ```
pub struct SkipList<K, V, R = StdRng> {
    arena: NodeArena<K, V>,
    /// Header forward slots, exactly `max_level` long.
    head: Vec<Link>,
    /// Height of the tallest linked node, 0 when empty.
    current_level: usize,
    levels: LevelGenerator<R>,
    metrics: EngineMetrics,
}

impl<K: Ord, V> SkipList<K, V, StdRng> {
    /// Create an empty list whose node heights are drawn from an entropy-seeded generator.
    pub fn new(max_level: usize) -> Result<Self> {
        Self::with_config(&Config::new(max_level))
    }

    /// Create an empty list from a [`Config`]. A configured seed makes heights reproducible.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let levels = match config.seed {
            Some(seed) => LevelGenerator::seeded(seed, config.max_level),
            None => LevelGenerator::from_entropy(config.max_level),
        };
        Self::from_parts(levels)
    }
}

impl<K: Ord, V> Default for SkipList<K, V, StdRng> {
    fn default() -> Self {
        Self::with_head(
            vec![None; DEFAULT_MAX_LEVEL],
            LevelGenerator::from_entropy(DEFAULT_MAX_LEVEL),
        )
    }
}

impl<K: Ord, V, R: Rng> SkipList<K, V, R> {
    /// Create an empty list driven by a caller-provided random source.
    ///
    /// Fails with [`SkipListError::InvalidConfiguration`] when `max_level` is 0,
    /// and with [`SkipListError::ResourceExhausted`] when the header cannot be allocated.
    pub fn with_rng(max_level: usize, rng: R) -> Result<Self> {
        Config::new(max_level).validate()?;
        Self::from_parts(LevelGenerator::new(rng, max_level))
    }

    /// Allocate the header row for `levels.max_level()` and build an empty list.
    fn from_parts(levels: LevelGenerator<R>) -> Result<Self> {
        let max_level = levels.max_level();
        let mut head = Vec::new();
        head.try_reserve_exact(max_level).map_err(|err| {
            log::warn!("cannot allocate header for max_level {}: {}", max_level, err);
            SkipListError::from(err)
        })?;
        head.resize(max_level, None);
        Ok(Self::with_head(head, levels))
    }

    fn with_head(head: Vec<Link>, levels: LevelGenerator<R>) -> Self {
        log::debug!("skip list created (max_level = {})", head.len());
        Self {
            arena: NodeArena::new(),
            head,
            current_level: 0,
            levels,
            metrics: EngineMetrics::new(),
        }
    }

    /// Number of linked nodes, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if no node is linked.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of levels currently in use.
    pub fn current_level(&self) -> usize {
        self.current_level
    }

    /// Upper bound on node height, fixed at construction.
    pub fn max_level(&self) -> usize {
        self.levels.max_level()
    }

    /// Operation counters for this list.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    // ── link helpers ──────────────────────────────────────────────

    fn next(&self, pred: Link, level: usize) -> Link {
        match pred {
            None => self.head.get(level).copied().flatten(),
            Some(id) => self
                .arena
                .get(id)
                .and_then(|node| node.forward.get(level).copied().flatten()),
        }
    }

    fn set_next(&mut self, pred: Link, level: usize, target: Link) {
        let slot = match pred {
            None => self.head.get_mut(level),
            Some(id) => self
                .arena
                .get_mut(id)
                .and_then(|node| node.forward.get_mut(level)),
        };
        if let Some(slot) = slot {
            *slot = target;
        }
    }

    /// Move right along `level` while the next key is strictly less than `key`.
    fn advance(&self, mut cur: Link, level: usize, key: &K) -> Link {
        while let Some(next) = self.next(cur, level) {
            match self.arena.get(next) {
                Some(node) if node.key < *key => cur = Some(next),
                _ => break,
            }
        }
        cur
    }

    /// Descend from the top level in use and record the last node before
    /// `key` at each level. The result is `current_level` long; callers treat
    /// any level past its end as the header.
    fn find_predecessors(&self, key: &K) -> Vec<Link> {
        let mut update = vec![None; self.current_level];
        let mut cur = None;
        for level in (0..self.current_level).rev() {
            cur = self.advance(cur, level, key);
            update[level] = cur;
        }
        update
    }

    /// Handle of the linked node holding `key`, expired or not.
    fn find_node(&self, key: &K) -> Option<NodeId> {
        let mut cur = None;
        for level in (0..self.current_level).rev() {
            cur = self.advance(cur, level, key);
        }
        let candidate = self.next(cur, 0)?;
        let node = self.arena.get(candidate)?;
        (node.key == *key).then_some(candidate)
    }

    fn find_live(&self, key: &K, now: Instant) -> Option<&Node<K, V>> {
        self.find_node(key)
            .and_then(|id| self.arena.get(id))
            .filter(|node| !node.expiry.is_expired_at(now))
    }

    // ── search ────────────────────────────────────────────────────

    /// Look up `key` against the current monotonic time.
    /// Returns `None` if the key is absent or its TTL has passed.
    pub fn search(&self, key: &K) -> Option<&V> {
        self.search_at(key, Instant::now())
    }

    /// Look up `key` as of `now`. Never mutates the list, even when the
    /// hit turns out to be expired.
    pub fn search_at(&self, key: &K, now: Instant) -> Option<&V> {
        let found = self.find_live(key, now).map(|node| &node.value);
        self.metrics.record_search(found.is_some());
        found
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Height of the node holding `key`, expired or not.
    pub fn height_of(&self, key: &K) -> Option<usize> {
        self.find_node(key)
            .and_then(|id| self.arena.get(id))
            .map(Node::height)
    }

    // ── insert ────────────────────────────────────────────────────

    /// Insert an entry that never expires. Overwrites an existing key.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.insert_with_expiry(key, value, Expiry::Never)
    }

    /// Insert with an explicit expiry.
    ///
    /// An existing key gets its value and expiry replaced in place; its
    /// height and links do not change. A new key gets a random height and
    /// is spliced into each of its levels.
    ///
    /// All memory for a new node is reserved before any link is touched,
    /// so an allocation failure leaves the list unchanged.
    pub fn insert_with_expiry(&mut self, key: K, value: V, expiry: Expiry) -> Result<()> {
        let update = self.find_predecessors(&key);

        let existing = self.next(update.first().copied().flatten(), 0);
        let arena = &mut self.arena;
        if let Some(node) = existing.and_then(|id| arena.get_mut(id)) {
            if node.key == key {
                node.value = value;
                node.expiry = expiry;
                self.metrics.record_update();
                log::trace!("updated existing node in place (height {})", node.height());
                return Ok(());
            }
        }

        let height = self.levels.random_level();
        self.splice_new(&update, key, value, expiry, height)
    }

    /// Reserve a node of `height` and link it after `update[i]` on each of its
    /// levels. Nothing is linked and `current_level` is untouched if the
    /// reservation fails.
    fn splice_new(
        &mut self,
        update: &[Link],
        key: K,
        value: V,
        expiry: Expiry,
        height: usize,
    ) -> Result<()> {
        let node = self
            .arena
            .try_reserve_one()
            .and_then(|()| Node::try_new(key, value, height, expiry))
            .map_err(|err| {
                log::warn!("insert aborted: {}", err);
                err
            })?;

        if height > self.current_level {
            self.current_level = height;
        }

        let id = self.arena.insert(node);
        for level in 0..height {
            let pred = update.get(level).copied().flatten();
            let succ = self.next(pred, level);
            self.set_next(Some(id), level, succ);
            self.set_next(pred, level, Some(id));
        }

        self.metrics.record_insert();
        log::trace!("linked new node at height {} (len = {})", height, self.len());
        Ok(())
    }

    // ── erase ─────────────────────────────────────────────────────

    /// Remove `key`. Returns true if a node was unlinked, whether or not it had expired.
    pub fn erase(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Remove `key` and return its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|entry| entry.value)
    }

    /// Remove `key` and return the whole entry.
    pub fn remove_entry(&mut self, key: &K) -> Option<Entry<K, V>> {
        let update = self.find_predecessors(key);
        let target = self.next(update.first().copied().flatten(), 0)?;
        if self.arena.get(target).map_or(true, |node| node.key != *key) {
            return None;
        }
        let node = self.unlink(&update, target)?;
        self.metrics.record_erase();
        log::trace!("erased node (len = {})", self.len());
        Some(Entry {
            key: node.key,
            value: node.value,
            expiry: node.expiry,
        })
    }

    /// Relink every level whose predecessor points at `target`, stopping at
    /// the first that does not, then free the node and drop empty top levels.
    fn unlink(&mut self, update: &[Link], target: NodeId) -> Option<Node<K, V>> {
        for (level, &pred) in update.iter().enumerate().take(self.current_level) {
            if self.next(pred, level) != Some(target) {
                break;
            }
            let succ = self.next(Some(target), level);
            self.set_next(pred, level, succ);
        }

        let node = self.arena.remove(target)?;
        while self.current_level > 0 && self.head[self.current_level - 1].is_none() {
            self.current_level -= 1;
        }
        Some(node)
    }

    /// Erase by handle. The key is borrowed from the node itself for the descent.
    fn erase_node(&mut self, id: NodeId) -> bool {
        let update = match self.arena.get(id) {
            Some(node) => self.find_predecessors(&node.key),
            None => return false,
        };
        self.unlink(&update, id).is_some()
    }

    /// Drop every node. The list stays usable with the same `max_level`.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head.iter_mut().for_each(|slot| *slot = None);
        self.current_level = 0;
    }

    // ── expiration ────────────────────────────────────────────────

    /// Sweep using the current time. See [`remove_expired_nodes_at`](Self::remove_expired_nodes_at).
    pub fn remove_expired_nodes(&mut self) -> usize {
        self.remove_expired_nodes_at(Instant::now())
    }

    /// Snapshot sweep: one pass over level 0 collects the handles of every
    /// node expired at `now`, then each is erased. Returns the number removed.
    pub fn remove_expired_nodes_at(&mut self, now: Instant) -> usize {
        let expired: Vec<NodeId> = level0_ids(&self.arena, self.first())
            .filter(|&id| {
                self.arena
                    .get(id)
                    .map_or(false, |node| node.expiry.is_expired_at(now))
            })
            .collect();

        let removed = expired
            .into_iter()
            .filter(|&id| self.erase_node(id))
            .count();

        self.metrics.record_sweep(removed);
        log::debug!("remove_expired_nodes: {} removed, {} left", removed, self.len());
        removed
    }

    /// Sweep using the current time. See [`cleanup_expired_nodes_at`](Self::cleanup_expired_nodes_at).
    pub fn cleanup_expired_nodes(&mut self) -> usize {
        self.cleanup_expired_nodes_at(Instant::now())
    }

    /// Streaming sweep: walks level 0 and captures each node's successor
    /// before erasing it, so the erased node is never read again.
    /// Leaves the same structure as [`remove_expired_nodes_at`](Self::remove_expired_nodes_at).
    pub fn cleanup_expired_nodes_at(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        let mut cursor = self.first();

        while let Some(id) = cursor {
            let expired = match self.arena.get(id) {
                Some(node) => {
                    cursor = node.forward.first().copied().flatten();
                    node.expiry.is_expired_at(now)
                }
                None => break,
            };
            if expired && self.erase_node(id) {
                removed += 1;
            }
        }

        self.metrics.record_sweep(removed);
        log::debug!("cleanup_expired_nodes: {} removed, {} left", removed, self.len());
        removed
    }

    /// Expiry of a linked key, whether or not it has passed.
    pub fn expiry_of(&self, key: &K) -> Option<Expiry> {
        self.find_node(key)
            .and_then(|id| self.arena.get(id))
            .map(|node| node.expiry)
    }

    /// Time left on a live key. `None` if the key is absent, expired or has no TTL.
    pub fn remaining_ttl(&self, key: &K) -> Option<Duration> {
        let now = Instant::now();
        self.find_live(key, now)
            .and_then(|node| node.expiry.remaining_at(now))
    }

    /// Replace the expiry of a live key. Returns false if the key is absent or expired.
    pub fn set_expiry(&mut self, key: &K, expiry: Expiry) -> bool {
        self.set_expiry_at(key, expiry, Instant::now())
    }

    /// Replace the expiry of a key that is live as of `now`.
    pub fn set_expiry_at(&mut self, key: &K, expiry: Expiry, now: Instant) -> bool {
        let target = self.find_node(key);
        match target.and_then(|id| self.arena.get_mut(id)) {
            Some(node) if !node.expiry.is_expired_at(now) => {
                node.expiry = expiry;
                true
            }
            _ => false,
        }
    }

    /// Remove the TTL from a live key.
    pub fn persist(&mut self, key: &K) -> bool {
        self.set_expiry(key, Expiry::Never)
    }

    // ── traversal ─────────────────────────────────────────────────

    fn first(&self) -> Link {
        self.head.first().copied().flatten()
    }

    /// All linked entries in key order, expired ones included.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.arena, self.first(), 0)
    }

    /// Entries linked at `level`, in key order. Empty for levels not in use.
    pub fn iter_level(&self, level: usize) -> Iter<'_, K, V> {
        let start = if level < self.current_level {
            self.head[level]
        } else {
            None
        };
        Iter::new(&self.arena, start, level)
    }

    /// Live entries in key order as of the current time.
    pub fn scan(&self) -> Vec<(&K, &V)> {
        self.scan_at(Instant::now())
    }

    /// Live entries in key order as of `now`.
    pub fn scan_at(&self, now: Instant) -> Vec<(&K, &V)> {
        level0_ids(&self.arena, self.first())
            .filter_map(|id| self.arena.get(id))
            .filter(|node| !node.expiry.is_expired_at(now))
            .map(|node| (&node.key, &node.value))
            .collect()
    }

    /// For each level in use, highest first, the linked `(key, value)` pairs.
    pub fn levels(&self) -> Vec<Vec<(&K, &V)>> {
        (0..self.current_level)
            .rev()
            .map(|level| self.iter_level(level).collect())
            .collect()
    }

    /// Printable per-level view for diagnostics.
    pub fn dump(&self) -> Dump<'_, K, V> {
        Dump::new(
            (0..self.current_level)
                .rev()
                .map(|level| (level, self.iter_level(level).collect()))
                .collect(),
        )
    }

    // ── integrity ─────────────────────────────────────────────────

    /// Walk every level and check the structural invariants: strict key
    /// order, nesting of levels, level 0 covering every node, header and
    /// `current_level` consistency, and no links into freed slots.
    pub fn validate(&self) -> Result<()> {
        let max_level = self.max_level();
        if self.head.len() != max_level {
            return Err(corruption(format!(
                "header has {} slots, expected {}",
                self.head.len(),
                max_level
            )));
        }
        if self.current_level > max_level {
            return Err(corruption(format!(
                "current_level {} exceeds max_level {}",
                self.current_level, max_level
            )));
        }
        if let Some(level) = (self.current_level..max_level).find(|&l| self.head[l].is_some()) {
            return Err(corruption(format!(
                "header slot {} is set above current_level {}",
                level, self.current_level
            )));
        }

        let mut linked_per_level = vec![0usize; self.current_level];
        let mut taller_than = vec![0usize; self.current_level];
        let mut tallest = 0;

        for level in 0..self.current_level {
            let mut prev: Option<&K> = None;
            let mut cursor = self.head[level];
            while let Some(id) = cursor {
                let node = self.arena.get(id).ok_or_else(|| {
                    corruption(format!("level {} links to freed slot {}", level, id.index()))
                })?;
                if node.height() <= level || node.height() > max_level {
                    return Err(corruption(format!(
                        "node of height {} linked at level {}",
                        node.height(),
                        level
                    )));
                }
                if prev.map_or(false, |p| *p >= node.key) {
                    return Err(corruption(format!("level {} is not strictly increasing", level)));
                }
                linked_per_level[level] += 1;
                if linked_per_level[level] > self.arena.len() {
                    return Err(corruption(format!("level {} does not terminate", level)));
                }
                if level == 0 {
                    tallest = tallest.max(node.height());
                    for (l, count) in taller_than.iter_mut().enumerate() {
                        if node.height() > l {
                            *count += 1;
                        }
                    }
                    if let Some(dangling) = node.forward.iter().flatten().find(|&&f| !self.arena.contains(f)) {
                        return Err(corruption(format!(
                            "forward link to freed slot {}",
                            dangling.index()
                        )));
                    }
                }
                prev = Some(&node.key);
                cursor = node.forward[level];
            }
        }

        let on_level0 = linked_per_level.first().copied().unwrap_or(0);
        if on_level0 != self.arena.len() {
            return Err(corruption(format!(
                "{} nodes stored but {} reachable at level 0",
                self.arena.len(),
                on_level0
            )));
        }
        if tallest != self.current_level {
            return Err(corruption(format!(
                "current_level is {} but tallest node has height {}",
                self.current_level, tallest
            )));
        }
        if let Some(level) = (0..self.current_level).find(|&l| linked_per_level[l] != taller_than[l]) {
            return Err(corruption(format!(
                "level {} links {} nodes, {} nodes are tall enough",
                level, linked_per_level[level], taller_than[level]
            )));
        }
        Ok(())
    }
}

fn corruption(msg: String) -> SkipListError {
    SkipListError::Corruption(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::sync::atomic::Ordering;
    use rand::SeedableRng;

    fn seeded(max_level: usize) -> SkipList<i32, String> {
        SkipList::with_config(&Config::new(max_level).with_seed(42)).unwrap()
    }

    /// Every coin flip comes up heads, so every node is `max_level` tall.
    fn always_tall(max_level: usize) -> SkipList<i32, String, StepRng> {
        SkipList::with_rng(max_level, StepRng::new(0, 0)).unwrap()
    }

    /// Every node has height 1.
    fn always_flat(max_level: usize) -> SkipList<i32, String, StepRng> {
        SkipList::with_rng(max_level, StepRng::new(u64::MAX, 0)).unwrap()
    }

    fn level0_keys<R: Rng>(list: &SkipList<i32, String, R>) -> Vec<i32> {
        list.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let err = SkipList::<i32, String>::new(0).err().unwrap();
        assert!(matches!(err, SkipListError::InvalidConfiguration(_)));

        let err = SkipList::<i32, String, _>::with_rng(0, StdRng::seed_from_u64(1))
            .err()
            .unwrap();
        assert!(matches!(err, SkipListError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_unallocatable_max_level_rejected() {
        let err = SkipList::<i64, String>::new(usize::MAX).err().unwrap();
        assert!(matches!(err, SkipListError::ResourceExhausted(_)));

        let err = SkipList::<i64, String, _>::with_rng(usize::MAX, StdRng::seed_from_u64(1))
            .err()
            .unwrap();
        assert!(matches!(err, SkipListError::ResourceExhausted(_)));
    }

    #[test]
    fn test_large_max_level_keeps_update_small() {
        let mut list = SkipList::<i32, String>::with_config(&Config::new(1 << 20).with_seed(5))
            .unwrap();
        for k in 0..64 {
            list.insert(k, k.to_string()).unwrap();
        }
        assert_eq!(list.max_level(), 1 << 20);
        assert_eq!(list.find_predecessors(&10).len(), list.current_level());
        assert!(list.erase(&10));
        assert_eq!(list.len(), 63);
        list.validate().unwrap();
    }

    #[test]
    fn test_failed_reservation_leaves_list_untouched() {
        let mut list = seeded(4);
        for k in [1, 3, 5] {
            list.insert(k, k.to_string()).unwrap();
        }
        let len = list.len();
        let level = list.current_level();
        let before: Vec<Vec<i32>> = list
            .levels()
            .iter()
            .map(|lvl| lvl.iter().map(|(k, _)| **k).collect())
            .collect();

        let update = list.find_predecessors(&2);
        let err = list
            .splice_new(&update, 2, "two".into(), Expiry::Never, usize::MAX)
            .unwrap_err();
        assert!(matches!(err, SkipListError::ResourceExhausted(_)));

        assert_eq!(list.len(), len);
        assert_eq!(list.current_level(), level);
        assert_eq!(list.search(&2), None);
        let after: Vec<Vec<i32>> = list
            .levels()
            .iter()
            .map(|lvl| lvl.iter().map(|(k, _)| **k).collect())
            .collect();
        assert_eq!(before, after);
        list.validate().unwrap();

        // still usable afterwards
        list.insert(2, "two".into()).unwrap();
        assert_eq!(level0_keys(&list), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_insert_and_erase_on_empty_list() {
        let mut list = seeded(4);
        assert!(!list.erase(&1));
        list.insert(1, "one".into()).unwrap();
        assert!(list.erase(&1));
        assert!(!list.erase(&1));
        list.validate().unwrap();
    }

    #[test]
    fn test_new_list_is_empty() {
        let list = seeded(4);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.current_level(), 0);
        assert_eq!(list.max_level(), 4);
        assert_eq!(list.search(&1), None);
        assert!(list.levels().is_empty());
        list.validate().unwrap();
    }

    #[test]
    fn test_default_uses_default_max_level() {
        let list: SkipList<i32, String> = SkipList::default();
        assert_eq!(list.max_level(), DEFAULT_MAX_LEVEL);
    }

    #[test]
    fn test_insert_and_search() {
        let mut list = seeded(4);
        list.insert(1, "one".into()).unwrap();
        list.insert(2, "two".into()).unwrap();

        assert_eq!(list.search(&1), Some(&"one".to_string()));
        assert_eq!(list.search(&2), Some(&"two".to_string()));
        assert_eq!(list.search(&3), None);
        assert!(list.contains_key(&1));
        list.validate().unwrap();
    }

    #[test]
    fn test_reference_scenario() {
        let mut list = seeded(4);
        list.insert(1, "one".into()).unwrap();
        list.insert(2, "two".into()).unwrap();
        list.insert(3, "three".into()).unwrap();
        list.insert(4, "four".into()).unwrap();

        assert_eq!(list.search(&2), Some(&"two".to_string()));
        assert!(list.erase(&3));
        assert_eq!(list.search(&3), None);

        let levels = list.levels();
        let level0: Vec<(i32, &str)> = levels
            .last()
            .unwrap()
            .iter()
            .map(|(k, v)| (**k, v.as_str()))
            .collect();
        assert_eq!(level0, vec![(1, "one"), (2, "two"), (4, "four")]);
        list.validate().unwrap();
    }

    #[test]
    fn test_out_of_order_inserts_are_sorted() {
        let mut list = seeded(8);
        for k in [50, 10, 40, 20, 30, -5, 0] {
            list.insert(k, k.to_string()).unwrap();
        }
        assert_eq!(level0_keys(&list), vec![-5, 0, 10, 20, 30, 40, 50]);
        list.validate().unwrap();
    }

    #[test]
    fn test_overwrite_keeps_height() {
        let mut list = seeded(8);
        for k in 0..32 {
            list.insert(k, "first".into()).unwrap();
        }
        let heights: Vec<_> = (0..32).map(|k| list.height_of(&k)).collect();

        for k in 0..32 {
            list.insert(k, "second".into()).unwrap();
        }

        assert_eq!(list.len(), 32);
        assert_eq!(list.search(&7), Some(&"second".to_string()));
        let after: Vec<_> = (0..32).map(|k| list.height_of(&k)).collect();
        assert_eq!(heights, after);
        list.validate().unwrap();
    }

    #[test]
    fn test_overwrite_replaces_expiry() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(1, "short".into(), Expiry::At(now))
            .unwrap();
        list.insert(1, "forever".into()).unwrap();

        assert_eq!(list.expiry_of(&1), Some(Expiry::Never));
        assert_eq!(
            list.search_at(&1, now + Duration::from_secs(3600)),
            Some(&"forever".to_string())
        );
    }

    #[test]
    fn test_erase_is_idempotent() {
        let mut list = seeded(4);
        list.insert(9, "nine".into()).unwrap();

        assert!(list.erase(&9));
        assert_eq!(list.search(&9), None);
        assert!(!list.erase(&9));
        assert!(list.is_empty());
        list.validate().unwrap();
    }

    #[test]
    fn test_erase_missing_key_between_nodes() {
        let mut list = seeded(4);
        list.insert(1, "one".into()).unwrap();
        list.insert(3, "three".into()).unwrap();
        assert!(!list.erase(&2));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_returns_value() {
        let mut list = seeded(4);
        list.insert(5, "five".into()).unwrap();
        assert_eq!(list.remove(&5), Some("five".to_string()));
        assert_eq!(list.remove(&5), None);
    }

    #[test]
    fn test_remove_entry_keeps_expiry() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(5, "five".into(), Expiry::At(now)).unwrap();

        let entry = list.remove_entry(&5).unwrap();
        assert_eq!(entry.key, 5);
        assert_eq!(entry.value, "five");
        assert_eq!(entry.expiry, Expiry::At(now));
        assert!(entry.has_ttl());
    }

    #[test]
    fn test_level_shrinks_after_erasing_tallest() {
        let mut list = always_tall(5);
        list.insert(1, "one".into()).unwrap();
        assert_eq!(list.current_level(), 5);
        assert_eq!(list.height_of(&1), Some(5));

        assert!(list.erase(&1));
        assert_eq!(list.current_level(), 0);
        list.validate().unwrap();
    }

    #[test]
    fn test_flat_list_is_a_linked_list() {
        let mut list = always_flat(6);
        for k in (0..10).rev() {
            list.insert(k, k.to_string()).unwrap();
        }
        assert_eq!(list.current_level(), 1);
        assert_eq!(list.levels().len(), 1);
        assert_eq!(level0_keys(&list), (0..10).collect::<Vec<_>>());
        list.validate().unwrap();
    }

    #[test]
    fn test_tall_list_links_every_level() {
        let mut list = always_tall(3);
        for k in [3, 1, 2] {
            list.insert(k, k.to_string()).unwrap();
        }
        for level in 0..3 {
            let keys: Vec<i32> = list.iter_level(level).map(|(k, _)| *k).collect();
            assert_eq!(keys, vec![1, 2, 3]);
        }
        assert_eq!(list.iter_level(3).count(), 0);
    }

    #[test]
    fn test_erase_middle_of_tall_list() {
        let mut list = always_tall(3);
        for k in 1..=3 {
            list.insert(k, k.to_string()).unwrap();
        }
        assert!(list.erase(&2));
        for level in 0..3 {
            let keys: Vec<i32> = list.iter_level(level).map(|(k, _)| *k).collect();
            assert_eq!(keys, vec![1, 3]);
        }
        assert_eq!(list.current_level(), 3);
        list.validate().unwrap();
    }

    #[test]
    fn test_nesting_holds_after_churn() {
        let mut list = seeded(6);
        for k in 0..200 {
            list.insert(k, k.to_string()).unwrap();
        }
        for k in (0..200).step_by(3) {
            assert!(list.erase(&k));
        }
        list.validate().unwrap();

        // every key on level i is also on level i - 1
        let levels = list.levels();
        for pair in levels.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            for (k, _) in upper {
                assert!(lower.iter().any(|(lk, _)| lk == k));
            }
        }
    }

    #[test]
    fn test_expired_entry_hidden_but_linked() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(1, "soon".into(), Expiry::after_from(now, Duration::from_secs(1)))
            .unwrap();

        assert_eq!(list.search_at(&1, now), Some(&"soon".to_string()));
        let later = now + Duration::from_secs(2);
        assert_eq!(list.search_at(&1, later), None);
        assert_eq!(list.search_at(&1, later), None);

        // lookups never remove
        assert_eq!(list.len(), 1);
        assert!(list.height_of(&1).is_some());
    }

    #[test]
    fn test_erase_expired_entry_returns_true() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(1, "gone".into(), Expiry::At(now)).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(list.search(&1), None);
        assert!(list.erase(&1));
    }

    #[test]
    fn test_both_sweeps_remove_the_same_nodes() {
        let now = Instant::now();
        let build = || {
            let mut list = seeded(6);
            for k in 0..100 {
                let expiry = if k % 4 == 0 {
                    Expiry::At(now)
                } else if k % 4 == 1 {
                    Expiry::after_from(now, Duration::from_secs(60))
                } else {
                    Expiry::Never
                };
                list.insert_with_expiry(k, k.to_string(), expiry).unwrap();
            }
            list
        };
        let later = now + Duration::from_secs(1);

        let mut a = build();
        let mut b = build();
        assert_eq!(a.remove_expired_nodes_at(later), 25);
        assert_eq!(b.cleanup_expired_nodes_at(later), 25);

        assert_eq!(level0_keys(&a), level0_keys(&b));
        assert_eq!(a.len(), 75);
        assert!(level0_keys(&a).iter().all(|k| k % 4 != 0));
        a.validate().unwrap();
        b.validate().unwrap();
    }

    #[test]
    fn test_sweep_of_adjacent_expired_nodes() {
        let now = Instant::now();
        let mut list = always_tall(4);
        for k in 0..10 {
            list.insert_with_expiry(k, k.to_string(), Expiry::At(now)).unwrap();
        }
        list.insert(10, "keep".into()).unwrap();

        assert_eq!(list.cleanup_expired_nodes_at(now + Duration::from_millis(1)), 10);
        assert_eq!(level0_keys(&list), vec![10]);
        list.validate().unwrap();
    }

    #[test]
    fn test_sweep_everything_resets_level() {
        let now = Instant::now();
        let mut list = seeded(8);
        for k in 0..50 {
            list.insert_with_expiry(k, k.to_string(), Expiry::At(now)).unwrap();
        }
        assert_eq!(list.remove_expired_nodes_at(now + Duration::from_secs(1)), 50);
        assert!(list.is_empty());
        assert_eq!(list.current_level(), 0);
        list.validate().unwrap();
    }

    #[test]
    fn test_sweep_before_deadline_removes_nothing() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(1, "one".into(), Expiry::after_from(now, Duration::from_secs(5)))
            .unwrap();
        assert_eq!(list.remove_expired_nodes_at(now), 0);
        assert_eq!(list.cleanup_expired_nodes_at(now), 0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_ttl_management() {
        let mut list = seeded(4);
        list.insert_with_expiry(1, "one".into(), Expiry::after(Duration::from_secs(60)))
            .unwrap();
        list.insert(2, "two".into()).unwrap();

        let remaining = list.remaining_ttl(&1).unwrap();
        assert!(remaining > Duration::from_secs(50));
        assert_eq!(list.remaining_ttl(&2), None);
        assert_eq!(list.remaining_ttl(&3), None);

        assert!(list.persist(&1));
        assert_eq!(list.remaining_ttl(&1), None);
        assert_eq!(list.expiry_of(&1), Some(Expiry::Never));

        assert!(list.set_expiry(&2, Expiry::after(Duration::from_secs(30))));
        assert!(list.remaining_ttl(&2).is_some());
        assert!(!list.set_expiry(&3, Expiry::Never));
    }

    #[test]
    fn test_set_expiry_on_expired_key_fails() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert_with_expiry(1, "one".into(), Expiry::At(now)).unwrap();
        let later = now + Duration::from_secs(1);
        assert!(!list.set_expiry_at(&1, Expiry::Never, later));
    }

    #[test]
    fn test_scan_skips_expired() {
        let now = Instant::now();
        let mut list = seeded(4);
        list.insert(1, "one".into()).unwrap();
        list.insert_with_expiry(2, "two".into(), Expiry::At(now)).unwrap();
        list.insert(3, "three".into()).unwrap();

        let later = now + Duration::from_secs(1);
        let keys: Vec<i32> = list.scan_at(later).into_iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 3]);
        // iter is structural and still sees the dead node
        assert_eq!(list.iter().count(), 3);
    }

    #[test]
    fn test_dump_lists_levels_top_down() {
        let mut list = always_tall(2);
        list.insert(1, "one".into()).unwrap();
        list.insert(2, "two".into()).unwrap();
        assert_eq!(
            list.dump().to_string(),
            "Level 1: (1, one) (2, two)\nLevel 0: (1, one) (2, two)\n"
        );
    }

    #[test]
    fn test_clear() {
        let mut list = seeded(4);
        for k in 0..10 {
            list.insert(k, k.to_string()).unwrap();
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.current_level(), 0);
        list.insert(3, "three".into()).unwrap();
        assert_eq!(level0_keys(&list), vec![3]);
        list.validate().unwrap();
    }

    #[test]
    fn test_metrics_track_operations() {
        let mut list = seeded(4);
        list.insert(1, "one".into()).unwrap();
        list.insert(1, "uno".into()).unwrap();
        list.search(&1);
        list.search(&2);
        list.erase(&1);
        list.remove_expired_nodes();

        let m = list.metrics();
        assert_eq!(m.inserts.load(Ordering::Relaxed), 1);
        assert_eq!(m.updates.load(Ordering::Relaxed), 1);
        assert_eq!(m.searches.load(Ordering::Relaxed), 2);
        assert_eq!(m.hits.load(Ordering::Relaxed), 1);
        assert_eq!(m.erases.load(Ordering::Relaxed), 1);
        assert_eq!(m.sweeps.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_arena_slots_are_reused() {
        let mut list = seeded(4);
        for round in 0..5 {
            for k in 0..20 {
                list.insert(k, round.to_string()).unwrap();
            }
            for k in 0..20 {
                assert!(list.erase(&k));
            }
        }
        assert!(list.arena.capacity() <= 20);
        list.validate().unwrap();
    }
}
