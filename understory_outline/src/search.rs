// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Search: literal substring filtering with forced-open ancestors.
//!
//! Starting a search captures an [`ExpansionSnapshot`] of every node. While
//! the search is active, ancestors of matches are expanded regardless of
//! their prior state and the visible list is restricted to matches and those
//! ancestors. Mutations made while searching refresh the match set against
//! the same snapshot. Clearing the search restores the snapshot.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::layout::LayoutTree;
use crate::options::OutlineOptions;
use crate::table::NodeTable;
use crate::types::{LayoutFlags, NodeId};

/// Expand/collapse state of every node at one point in time.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExpansionSnapshot {
    expanded: HashMap<NodeId, bool>,
}

impl ExpansionSnapshot {
    pub(crate) fn capture(layout: &LayoutTree) -> Self {
        Self {
            expanded: layout
                .ids()
                .map(|id| (id, layout.node(id).is_expanded()))
                .collect(),
        }
    }

    /// Record the state of a node that was not around at capture time.
    fn remember(&mut self, id: NodeId, expanded: bool) {
        self.expanded.entry(id).or_insert(expanded);
    }

    /// Put every node that still exists back into its captured state.
    pub(crate) fn restore(&self, layout: &mut LayoutTree) {
        for (&id, &expanded) in &self.expanded {
            layout.set_expanded(id, expanded);
        }
    }
}

/// An active search.
#[derive(Clone, Debug)]
pub(crate) struct Search {
    query: String,
    snapshot: ExpansionSnapshot,
    matches: Vec<NodeId>,
    keep: HashSet<NodeId>,
}

impl Search {
    /// Flag matches for `query` and force their ancestor chains open.
    pub(crate) fn begin(
        table: &NodeTable,
        layout: &mut LayoutTree,
        query: &str,
        options: &OutlineOptions,
        snapshot: ExpansionSnapshot,
    ) -> Self {
        let mut search = Self {
            query: String::from(query),
            snapshot,
            matches: Vec::new(),
            keep: HashSet::new(),
        };
        search.apply(table, layout, options);
        tracing::debug!(query, matches = search.matches.len(), "search applied");
        search
    }

    /// Recompute matches after the records or the tree changed.
    ///
    /// The snapshot taken when the search began is kept. Ancestors that need
    /// to open are forced open; ancestors that no longer lead to a match are
    /// left as they are until the search ends.
    pub(crate) fn refresh(
        &mut self,
        table: &NodeTable,
        layout: &mut LayoutTree,
        options: &OutlineOptions,
    ) {
        self.clear_flags(layout);
        self.apply(table, layout, options);
        tracing::trace!(query = %self.query, matches = self.matches.len(), "search refreshed");
    }

    fn apply(&mut self, table: &NodeTable, layout: &mut LayoutTree, options: &OutlineOptions) {
        let fold_case = !options.case_sensitive_search;
        let needle = if fold_case {
            self.query.to_lowercase()
        } else {
            self.query.clone()
        };
        self.matches = table
            .iter()
            .filter(|(_, r)| r.contains_text(&needle, &options.search_fields, fold_case))
            .map(|(id, _)| id)
            .filter(|id| reachable(table, layout, *id))
            .collect();

        self.keep.clear();
        for &id in &self.matches {
            layout.node_mut(id).flags.insert(LayoutFlags::SEARCH_MATCH);
            self.keep.insert(id);
            let chain: Vec<NodeId> = layout.ancestors(id).collect();
            for ancestor in chain {
                self.keep.insert(ancestor);
                if !layout.node(ancestor).is_expanded() {
                    self.snapshot.remember(ancestor, false);
                    layout.set_expanded(ancestor, true);
                }
            }
        }
    }

    fn clear_flags(&self, layout: &mut LayoutTree) {
        for &id in &self.matches {
            if let Some(n) = layout.get_mut(id) {
                n.flags.remove(LayoutFlags::SEARCH_MATCH);
            }
        }
    }

    /// Clear match flags and restore the captured expansion state.
    ///
    /// Returns the snapshot so a follow-up query can reuse it.
    pub(crate) fn finish(self, layout: &mut LayoutTree) -> ExpansionSnapshot {
        self.clear_flags(layout);
        self.snapshot.restore(layout);
        self.snapshot
    }

    pub(crate) fn query(&self) -> &str {
        &self.query
    }

    pub(crate) fn keep(&self) -> &HashSet<NodeId> {
        &self.keep
    }

    pub(crate) fn matches(&self) -> &[NodeId] {
        &self.matches
    }
}

/// A node can be shown by search only if it and all its ancestors are
/// visible and its chain ends in the root list.
fn reachable(table: &NodeTable, layout: &LayoutTree, id: NodeId) -> bool {
    let mut top = id;
    for n in core::iter::once(id).chain(layout.ancestors(id)) {
        if !table.get(n).is_some_and(|r| r.is_visible()) {
            return false;
        }
        top = n;
    }
    !layout.node(top).pending && layout.roots().contains(&top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use alloc::vec;

    /// A -> [B -> [Match1], Match2], C
    fn fixture() -> (NodeTable, LayoutTree, [NodeId; 5]) {
        let mut table = NodeTable::new();
        let mut layout = LayoutTree::new();
        let records = [
            Record::new(1, "A"),
            Record::new(2, "B").with_parent(1),
            Record::new(3, "Match1").with_parent(2),
            Record::new(4, "match2").with_parent(1),
            Record::new(5, "C"),
        ];
        let ids = records.map(|r| {
            let parent = r.parent_id.clone().and_then(|p| table.lookup(&p));
            let id = table.insert(r).unwrap();
            layout.insert(id, parent.is_none());
            layout.attach(id, parent, None, true);
            id
        });
        (table, layout, ids)
    }

    #[test]
    fn forces_ancestors_open_and_restores() {
        let (table, mut layout, [a, b, m1, m2, c]) = fixture();
        layout.set_expanded(a, false);
        let snapshot = ExpansionSnapshot::capture(&layout);
        let search = Search::begin(
            &table,
            &mut layout,
            "MATCH",
            &OutlineOptions::default(),
            snapshot,
        );
        assert_eq!(search.matches(), [m1, m2]);
        assert!(search.keep().contains(&a));
        assert!(search.keep().contains(&b));
        assert!(!search.keep().contains(&c));
        assert!(layout.node(a).is_expanded());
        assert!(layout.node(b).is_expanded());
        assert!(layout.node(m1).matches_search());
        assert!(!layout.node(b).matches_search(), "ancestors are not matches");

        search.finish(&mut layout);
        assert!(!layout.node(a).is_expanded());
        assert!(!layout.node(b).is_expanded());
        assert!(!layout.node(m1).matches_search());
    }

    #[test]
    fn case_sensitive_option() {
        let (table, mut layout, [_, _, m1, _, _]) = fixture();
        let options = OutlineOptions::default().case_sensitive_search(true);
        let snapshot = ExpansionSnapshot::capture(&layout);
        let search = Search::begin(&table, &mut layout, "Match", &options, snapshot);
        assert_eq!(search.matches(), vec![m1]);
        assert_eq!(search.query(), "Match");
    }

    #[test]
    fn invisible_ancestor_hides_match() {
        let (mut table, mut layout, [_, b, _, m2, _]) = fixture();
        table.get_mut(b).unwrap().visible = Some(false);
        layout.detach(b);
        layout.attach(b, layout_parent(&table, b), None, false);
        let snapshot = ExpansionSnapshot::capture(&layout);
        let search = Search::begin(
            &table,
            &mut layout,
            "match",
            &OutlineOptions::default(),
            snapshot,
        );
        assert_eq!(search.matches(), [m2]);
    }

    #[test]
    fn refresh_drops_dead_matches_and_keeps_snapshot() {
        let (mut table, mut layout, [a, b, m1, m2, _]) = fixture();
        layout.set_expanded(a, false);
        let snapshot = ExpansionSnapshot::capture(&layout);
        let options = OutlineOptions::default();
        let mut search = Search::begin(&table, &mut layout, "match1", &options, snapshot);
        assert_eq!(search.matches(), [m1]);

        layout.detach(m1);
        layout.remove(m1);
        table.remove(m1);
        table.get_mut(m2).unwrap().label = String::from("now match1 too");
        search.refresh(&table, &mut layout, &options);
        assert_eq!(search.matches(), [m2]);
        assert!(!search.keep().contains(&b));
        assert!(layout.node(m2).matches_search());

        search.finish(&mut layout);
        assert!(!layout.node(a).is_expanded());
        assert!(!layout.node(m2).matches_search());
    }

    fn layout_parent(table: &NodeTable, id: NodeId) -> Option<NodeId> {
        table
            .get(id)
            .and_then(|r| r.parent_id.as_ref())
            .and_then(|p| table.lookup(p))
    }
}
