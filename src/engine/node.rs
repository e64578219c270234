//! SKIPTTL - Node Storage
//!
//! Nodes live in a slab-style arena and refer to each other through
//! `NodeId` handles instead of pointers. The arena is the single owner of
//! every node: links are plain `Option<NodeId>` values, so there are no
//! reference cycles and dropping the arena releases everything.
//!
//! Removed slots are threaded onto a free list and reused by later inserts,
//! keeping the arena as large as the peak population rather than the total
//! number of inserts.

use crate::error::Result;
use crate::types::NodeId;

use super::ttl::Expiry;

/// One stored key-value association.
#[derive(Debug)]
pub struct Node<K, V> {
    pub key: K,
    pub value: V,
    /// `forward[i]` is the next node at level `i`. Length is the node height.
    pub forward: Vec<Option<NodeId>>,
    pub expiry: Expiry,
}

impl<K, V> Node<K, V> {
    /// Build a node of the given height with every slot reserved up front.
    /// Fails without side effects if the forward slots cannot be allocated.
    pub fn try_new(key: K, value: V, height: usize, expiry: Expiry) -> Result<Self> {
        let mut forward = Vec::new();
        forward.try_reserve_exact(height)?;
        forward.resize(height, None);
        Ok(Self {
            key,
            value,
            forward,
            expiry,
        })
    }

    /// Number of levels this node participates in.
    pub fn height(&self) -> usize {
        self.forward.len()
    }
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<usize> },
}

/// Slab of nodes addressed by `NodeId`.
#[derive(Debug)]
pub struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<usize>,
    len: usize,
}

impl<K, V> NodeArena<K, V> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots, occupied or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Make sure the next `insert` cannot fail to allocate.
    pub fn try_reserve_one(&mut self) -> Result<()> {
        if self.free_head.is_none() {
            self.slots.try_reserve(1)?;
        }
        Ok(())
    }

    /// Store a node and return its handle. Reuses a freed slot when one exists.
    /// Call `try_reserve_one` first when allocation failure must be reported.
    pub fn insert(&mut self, node: Node<K, V>) -> NodeId {
        self.len += 1;
        match self.free_head {
            Some(idx) => {
                if let Slot::Vacant { next_free } = self.slots[idx] {
                    self.free_head = next_free;
                }
                self.slots[idx] = Slot::Occupied(node);
                NodeId(idx)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Take a node out of the arena, freeing its slot.
    pub fn remove(&mut self, id: NodeId) -> Option<Node<K, V>> {
        let slot = self.slots.get_mut(id.0)?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match std::mem::replace(slot, vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(id.0);
                self.len -= 1;
                Some(node)
            }
            Slot::Vacant { .. } => None,
        }
    }

    /// Borrow the node behind `id`, if it is live.
    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Mutably borrow the node behind `id`, if it is live.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Returns true if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Drop every node and reset the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
