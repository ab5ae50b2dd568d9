// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node table: the canonical data records, slot-allocated and indexed by id.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::record::{Record, RecordId};
use crate::types::NodeId;

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    record: Record,
}

/// Slot arena of [`Record`]s with an id index.
///
/// Slots are allocated here; the [`LayoutTree`](crate::layout::LayoutTree)
/// mirrors them at the same [`NodeId`].
#[derive(Clone, Default)]
pub struct NodeTable {
    /// slots
    slots: Vec<Option<Slot>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    index: HashMap<RecordId, NodeId>,
}

impl core::fmt::Debug for NodeTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeTable")
            .field("slots_total", &self.slots.len())
            .field("nodes_alive", &self.index.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl NodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if there are no live records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Store `record` in a fresh slot. Returns `None` if its id is taken.
    pub(crate) fn insert(&mut self, record: Record) -> Option<NodeId> {
        if self.index.contains_key(&record.id) {
            return None;
        }
        let key = record.id.clone();
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(Slot { generation, record });
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Some(Slot { generation, record }));
            self.generations.push(generation);
            (self.slots.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let id = NodeId::new(idx as u32, generation);
        self.index.insert(key, id);
        Some(id)
    }

    /// Free the slot of `id` and return its record.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Record> {
        if !self.is_alive(id) {
            return None;
        }
        let slot = self.slots[id.idx()].take()?;
        self.index.remove(&slot.record.id);
        self.free_list.push(id.idx());
        Some(slot.record)
    }

    /// Returns true if `id` refers to a live record.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots
            .get(id.idx())
            .and_then(|s| s.as_ref())
            .is_some_and(|s| s.generation == id.generation())
    }

    /// Resolve a record id to its live handle.
    pub fn lookup(&self, id: &RecordId) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// The record behind a live handle.
    pub fn get(&self, id: NodeId) -> Option<&Record> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.generation())
            .map(|s| &s.record)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Record> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|s| s.generation == id.generation())
            .map(|s| &mut s.record)
    }

    /// The record id behind a live handle.
    pub fn record_id(&self, id: NodeId) -> Option<&RecordId> {
        self.get(id).map(|r| &r.id)
    }

    /// Iterate live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Record)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            let s = s.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            Some((NodeId::new(i as u32, s.generation), &s.record))
        })
    }
}

/// Anything that can name a node: a handle, a record id, or a raw id value.
pub trait NodeRef {
    /// Resolve to a live handle, or `None` if unknown or stale.
    fn resolve(&self, table: &NodeTable) -> Option<NodeId>;
}

impl NodeRef for NodeId {
    fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
        table.is_alive(*self).then_some(*self)
    }
}

impl NodeRef for RecordId {
    fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
        table.lookup(self)
    }
}

impl NodeRef for str {
    fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
        table.lookup(&RecordId::from(self))
    }
}

impl NodeRef for alloc::string::String {
    fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
        self.as_str().resolve(table)
    }
}

impl<T: NodeRef + ?Sized> NodeRef for &T {
    fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
        (**self).resolve(table)
    }
}

macro_rules! int_node_ref {
    ($($t:ty),*) => {
        $(impl NodeRef for $t {
            fn resolve(&self, table: &NodeTable) -> Option<NodeId> {
                table.lookup(&RecordId::Int(i64::from(*self)))
            }
        })*
    };
}

int_node_ref!(i32, i64, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_refused() {
        let mut table = NodeTable::new();
        assert!(table.insert(Record::new(1, "a")).is_some());
        assert!(table.insert(Record::new(1, "b")).is_none());
        assert_eq!(table.len(), 1);
        let id = table.lookup(&RecordId::Int(1)).unwrap();
        assert_eq!(table.get(id).unwrap().label, "a");
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut table = NodeTable::new();
        let a = table.insert(Record::new(1, "a")).unwrap();
        assert!(table.is_alive(a));

        let removed = table.remove(a).unwrap();
        assert_eq!(removed.id, RecordId::Int(1));
        assert!(!table.is_alive(a));
        assert!(table.lookup(&RecordId::Int(1)).is_none());
        assert!(table.get(a).is_none());

        // Slot is reused but the generation bumps.
        let b = table.insert(Record::new(1, "again")).unwrap();
        assert!(table.is_alive(b));
        assert!(!table.is_alive(a));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut table = NodeTable::new();
        let a = table.insert(Record::new(1, "a")).unwrap();
        let b = table.insert(Record::new(2, "b")).unwrap();
        table.remove(a);
        let live: Vec<_> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(live, [b]);
    }

    #[test]
    fn node_refs_resolve() {
        let mut table = NodeTable::new();
        let n = table.insert(Record::new(7, "seven")).unwrap();
        let s = table.insert(Record::new("key", "text")).unwrap();
        assert_eq!(7_i32.resolve(&table), Some(n));
        assert_eq!(7_i64.resolve(&table), Some(n));
        assert_eq!(RecordId::Int(7).resolve(&table), Some(n));
        assert_eq!((&RecordId::Int(7)).resolve(&table), Some(n));
        assert_eq!(n.resolve(&table), Some(n));
        assert_eq!("key".resolve(&table), Some(s));
        assert_eq!(8_u32.resolve(&table), None);
        table.remove(n);
        assert_eq!(n.resolve(&table), None, "stale handles do not resolve");
    }
}
