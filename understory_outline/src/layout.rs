// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout tree: the UI-state mirror of the node table.
//!
//! Every live record has exactly one [`LayoutNode`] at the same [`NodeId`].
//! A node keeps three ordered child lists:
//!
//! - `children`: the live list, populated only while the node is expanded;
//! - `hidden_children`: the same list while the node is collapsed;
//! - `invisible`: children whose record has `visible == Some(false)`.
//!
//! Roots have the same split: [`LayoutTree::roots`] and
//! [`LayoutTree::invisible_roots`]. The root list is always live.

use alloc::vec::Vec;

use crate::types::{LayoutFlags, NodeId};

/// UI state for a single node.
#[derive(Clone, Debug)]
pub struct LayoutNode {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) hidden_children: Vec<NodeId>,
    pub(crate) invisible: Vec<NodeId>,
    pub(crate) flags: LayoutFlags,
    /// Waiting for its parent to arrive during ingestion.
    pub(crate) pending: bool,
}

impl LayoutNode {
    fn new(generation: u32, expanded: bool) -> Self {
        let mut flags = LayoutFlags::empty();
        flags.set(LayoutFlags::EXPANDED, expanded);
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            hidden_children: Vec::new(),
            invisible: Vec::new(),
            flags,
            pending: false,
        }
    }

    /// Parent handle, or `None` for roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Live children (empty while collapsed).
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Children retained while collapsed (empty while expanded).
    pub fn hidden_children(&self) -> &[NodeId] {
        &self.hidden_children
    }

    /// Children whose record is marked `visible: false`.
    pub fn invisible_children(&self) -> &[NodeId] {
        &self.invisible
    }

    /// UI flags.
    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    /// Whether the node is expanded.
    pub fn is_expanded(&self) -> bool {
        self.flags.contains(LayoutFlags::EXPANDED)
    }

    /// Whether the node is the current selection.
    pub fn is_selected(&self) -> bool {
        self.flags.contains(LayoutFlags::SELECTED)
    }

    /// Whether the node matches the active search.
    pub fn matches_search(&self) -> bool {
        self.flags.contains(LayoutFlags::SEARCH_MATCH)
    }

    /// Whether the node has any visible-eligible children, live or hidden.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || !self.hidden_children.is_empty()
    }

    /// The list that currently holds the visible-eligible children.
    fn live_mut(&mut self) -> &mut Vec<NodeId> {
        if self.is_expanded() {
            &mut self.children
        } else {
            &mut self.hidden_children
        }
    }
}

/// Where a node sat before it was detached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) parent: Option<NodeId>,
    pub(crate) index: usize,
    pub(crate) invisible: bool,
}

/// Slot arena of [`LayoutNode`]s plus the root sequence.
#[derive(Clone, Debug, Default)]
pub struct LayoutTree {
    nodes: Vec<Option<LayoutNode>>,
    roots: Vec<NodeId>,
    invisible_roots: Vec<NodeId>,
    len: usize,
}

impl LayoutTree {
    /// Create an empty layout tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live layout nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no layout nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visible-eligible roots in order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Roots whose record is marked `visible: false`.
    pub fn invisible_roots(&self) -> &[NodeId] {
        &self.invisible_roots
    }

    /// Returns true if `id` refers to a live layout node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// The layout node behind a live handle.
    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.generation())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.generation())
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &LayoutNode {
        self.get(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut LayoutNode {
        self.get_mut(id).expect("dangling NodeId")
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Create the mirror of a freshly allocated record slot. Not linked yet.
    pub(crate) fn insert(&mut self, id: NodeId, expanded: bool) {
        if self.nodes.len() <= id.idx() {
            self.nodes.resize_with(id.idx() + 1, || None);
        }
        debug_assert!(self.nodes[id.idx()].is_none(), "slot already occupied");
        self.nodes[id.idx()] = Some(LayoutNode::new(id.generation(), expanded));
        self.len += 1;
    }

    /// Drop the layout node of `id`. The caller detaches it first.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<LayoutNode> {
        if !self.is_alive(id) {
            return None;
        }
        self.len -= 1;
        self.nodes[id.idx()].take()
    }

    /// Link `id` under `parent` (or as a root) at `index`, clamped to the list.
    ///
    /// Visible nodes go to the parent's live list, which is `hidden_children`
    /// while the parent is collapsed; invisible nodes are appended to the
    /// invisible list. Returns the index the node landed at.
    pub(crate) fn attach(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        index: Option<usize>,
        visible: bool,
    ) -> usize {
        let list = match (parent, visible) {
            (None, true) => &mut self.roots,
            (None, false) => &mut self.invisible_roots,
            (Some(p), true) => self.node_mut(p).live_mut(),
            (Some(p), false) => &mut self.node_mut(p).invisible,
        };
        let at = index.map_or(list.len(), |i| i.min(list.len()));
        list.insert(at, id);
        let node = self.node_mut(id);
        node.parent = parent;
        node.pending = false;
        at
    }

    /// Unlink `id` from whichever list holds it.
    ///
    /// Returns `None` if the node is not linked anywhere (a pending orphan).
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<Placement> {
        let parent = self.get(id)?.parent;
        let (live, invisible) = match parent {
            None => (&mut self.roots, &mut self.invisible_roots),
            Some(p) => {
                let n = self.node_mut(p);
                let live = if n.is_expanded() {
                    &mut n.children
                } else {
                    &mut n.hidden_children
                };
                (live, &mut n.invisible)
            }
        };
        let placement = if let Some(index) = live.iter().position(|c| *c == id) {
            live.remove(index);
            Placement {
                parent,
                index,
                invisible: false,
            }
        } else {
            let index = invisible.iter().position(|c| *c == id)?;
            invisible.remove(index);
            Placement {
                parent,
                index,
                invisible: true,
            }
        };
        self.node_mut(id).parent = None;
        Some(placement)
    }

    /// Visible-eligible children of `parent` (or the roots), live or hidden.
    pub(crate) fn live_list(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(p) => {
                let n = self.node(p);
                if n.is_expanded() {
                    &n.children
                } else {
                    &n.hidden_children
                }
            }
        }
    }

    /// The list holding visible-eligible children of `parent` (or the roots).
    pub(crate) fn live_list_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            None => &mut self.roots,
            Some(p) => self.node_mut(p).live_mut(),
        }
    }

    /// Expand or collapse a node by moving its children between lists.
    ///
    /// Returns `true` if the state changed.
    pub(crate) fn set_expanded(&mut self, id: NodeId, expanded: bool) -> bool {
        let Some(n) = self.get_mut(id) else {
            return false;
        };
        if n.is_expanded() == expanded {
            return false;
        }
        if expanded {
            let mut hidden = core::mem::take(&mut n.hidden_children);
            n.children.append(&mut hidden);
        } else {
            let mut live = core::mem::take(&mut n.children);
            n.hidden_children.append(&mut live);
        }
        n.flags.set(LayoutFlags::EXPANDED, expanded);
        true
    }

    /// Iterate the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent_of(id), move |p| self.parent_of(*p))
    }

    /// Returns `true` if `id` is `ancestor` or lies in its subtree.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// `id` and every descendant, including hidden and invisible ones, in pre-order.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let node = self.node(n);
            // Reverse so the pre-order visits children in list order.
            for &c in node
                .children
                .iter()
                .chain(&node.hidden_children)
                .chain(&node.invisible)
                .rev()
            {
                stack.push(c);
            }
        }
        out
    }

    /// Iterate live handles in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| {
            let n = n.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            Some(NodeId::new(i as u32, n.generation))
        })
    }
}
