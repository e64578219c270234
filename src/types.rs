//! SKIPTTL - Core Type Definitions
//! Defines fundamental types shared across the engine.

use crate::engine::ttl::Expiry;

/// Stable handle to a node slot in the engine's arena.
/// Links between nodes are stored as `Option<NodeId>`; `None` marks the end of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw slot index inside the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An owned snapshot of a single entry, as handed out by `SkipList::remove_entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub expiry: Expiry,
}

impl<K, V> Entry<K, V> {
    /// Returns true if this entry carries a TTL.
    pub fn has_ttl(&self) -> bool {
        !self.expiry.is_never()
    }
}
