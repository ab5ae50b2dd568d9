// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-list resolution.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::layout::LayoutTree;
use crate::types::NodeId;

/// Flatten the layout tree into the ordered list of visible nodes.
///
/// Pre-order from each root in root order, descending only into live
/// `children` (never hidden or invisible ones), so the cost is proportional to
/// the visible set. With a `keep` set (active search), nodes outside it are
/// skipped together with their subtrees.
pub(crate) fn resolve(layout: &LayoutTree, keep: Option<&HashSet<NodeId>>) -> Vec<NodeId> {
    let admitted = |id: &NodeId| keep.is_none_or(|k| k.contains(id));
    let mut out = Vec::new();
    // Reverse so the stack pops roots and children in list order.
    let mut stack: Vec<NodeId> = layout.roots().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !admitted(&id) {
            continue;
        }
        out.push(id);
        stack.extend(layout.node(id).children().iter().rev().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn id(i: u32) -> NodeId {
        NodeId::new(i, 1)
    }

    /// 0 -> [1 -> [3], 2], 4 (second root)
    fn forest() -> LayoutTree {
        let mut t = LayoutTree::new();
        t.insert(id(0), true);
        t.insert(id(4), true);
        for i in 1..4 {
            t.insert(id(i), false);
        }
        t.attach(id(0), None, None, true);
        t.attach(id(4), None, None, true);
        t.attach(id(1), Some(id(0)), None, true);
        t.attach(id(2), Some(id(0)), None, true);
        t.attach(id(3), Some(id(1)), None, true);
        t
    }

    #[test]
    fn collapsed_children_are_skipped() {
        let t = forest();
        assert_eq!(resolve(&t, None), vec![id(0), id(1), id(2), id(4)]);
    }

    #[test]
    fn preorder_after_expand() {
        let mut t = forest();
        t.set_expanded(id(1), true);
        assert_eq!(resolve(&t, None), vec![id(0), id(1), id(3), id(2), id(4)]);
    }

    #[test]
    fn keep_set_prunes_subtrees() {
        let mut t = forest();
        t.set_expanded(id(1), true);
        let keep: HashSet<NodeId> = [id(0), id(1), id(3)].into_iter().collect();
        assert_eq!(resolve(&t, Some(&keep)), vec![id(0), id(1), id(3)]);
    }
}
