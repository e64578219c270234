//! SKIPTTL - Level Iterators
//! Read-only walks along a single level of the list.

use std::iter::FusedIterator;

use crate::types::NodeId;

use super::node::NodeArena;

/// Iterator over the `(key, value)` pairs linked at one level, in key order.
///
/// Yields every linked node, including ones whose TTL has passed but
/// which have not been swept yet.
pub struct Iter<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    cursor: Option<NodeId>,
    level: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(arena: &'a NodeArena<K, V>, start: Option<NodeId>, level: usize) -> Self {
        Self {
            arena,
            cursor: start,
            level,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.arena.get(id)?;
        self.cursor = node.forward.get(self.level).copied().flatten();
        Some((&node.key, &node.value))
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Walks level-0 handles. Used by the sweeps, which need ids rather than borrows.
pub(crate) fn level0_ids<K, V>(
    arena: &NodeArena<K, V>,
    start: Option<NodeId>,
) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(start, move |&id| {
        arena.get(id).and_then(|node| node.forward.first().copied().flatten())
    })
}
