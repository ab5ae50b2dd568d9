// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame summary types returned from commit.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::types::NodeId;

/// A batched set of changes derived from [`crate::Outline::commit`].
///
/// `visible` is the full ordered list a renderer draws. The other lists are
/// relative to the previous commit and let a renderer reconcile incrementally.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Every visible node, in display order.
    pub visible: Vec<NodeId>,
    /// Nodes visible now but not in the previous frame.
    pub entered: Vec<NodeId>,
    /// Nodes visible in the previous frame but not now, in their old order.
    pub exited: Vec<NodeId>,
    /// Nodes visible in both frames whose display index changed.
    pub moved: Vec<NodeId>,
    /// Visible nodes whose record was edited since the previous frame.
    pub updated: Vec<NodeId>,
    /// Whether the renderer should animate this transition.
    pub animate: bool,
    /// Whether a search is active.
    pub searching: bool,
    /// Height reserved for a detached root row, if configured and not searching.
    pub detached_root: Option<f64>,
}

impl Frame {
    /// Returns `true` if nothing entered, exited, moved, or was updated.
    pub fn is_unchanged(&self) -> bool {
        self.entered.is_empty()
            && self.exited.is_empty()
            && self.moved.is_empty()
            && self.updated.is_empty()
    }

    /// Display index of `id`, if visible.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.visible.iter().position(|v| *v == id)
    }

    /// Build a frame by diffing `visible` against the `previous` list.
    pub(crate) fn diff(previous: &[NodeId], visible: Vec<NodeId>, touched: &[NodeId]) -> Self {
        let before: HashMap<NodeId, usize> =
            previous.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut now: HashSet<NodeId> = HashSet::with_capacity(visible.len());
        let mut entered = Vec::new();
        let mut moved = Vec::new();
        for (i, id) in visible.iter().enumerate() {
            now.insert(*id);
            match before.get(id) {
                None => entered.push(*id),
                Some(&old) if old != i => moved.push(*id),
                Some(_) => {}
            }
        }
        let exited = previous
            .iter()
            .filter(|id| !now.contains(*id))
            .copied()
            .collect();
        let mut seen = HashSet::new();
        let updated = touched
            .iter()
            .filter(|id| now.contains(*id) && seen.insert(**id))
            .copied()
            .collect();
        Self {
            visible,
            entered,
            exited,
            moved,
            updated,
            animate: true,
            searching: false,
            detached_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn id(i: u32) -> NodeId {
        NodeId::new(i, 1)
    }

    #[test]
    fn diff_classifies_changes() {
        let prev = [id(0), id(1), id(2)];
        let f = Frame::diff(&prev, vec![id(0), id(3), id(1)], &[id(1), id(2), id(1)]);
        assert_eq!(f.entered, vec![id(3)]);
        assert_eq!(f.exited, vec![id(2)]);
        assert_eq!(f.moved, vec![id(1)]);
        assert_eq!(f.updated, vec![id(1)], "exited and repeated edits are dropped");
        assert_eq!(f.position_of(id(1)), Some(2));
        assert!(!f.is_unchanged());
    }

    #[test]
    fn identical_lists_are_unchanged() {
        let prev = [id(0), id(1)];
        let f = Frame::diff(&prev, prev.to_vec(), &[]);
        assert!(f.is_unchanged());
    }
}
