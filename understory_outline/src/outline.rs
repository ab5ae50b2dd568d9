// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The outline: node table and layout tree kept in step by one mutation API.

use alloc::vec::Vec;

use crate::drag::DragController;
use crate::events::{MoveEvent, OutlineEvent, Renderer, Request};
use crate::frame::Frame;
use crate::ingest::Orphans;
use crate::layout::{LayoutNode, LayoutTree};
use crate::options::{OutlineOptions, SelectOptions};
use crate::record::{Record, RecordId, RecordPatch};
use crate::search::{ExpansionSnapshot, Search};
use crate::table::{NodeRef, NodeTable};
use crate::types::{LayoutFlags, NodeId};
use crate::visible;

/// Interactive hierarchical view over flat, parent-referencing records.
///
/// Every mutation updates the [`NodeTable`] and the [`LayoutTree`] together and
/// leaves both untouched when it is refused. Presentation is batched: mutations
/// only mark the outline dirty, and [`Outline::commit`] (or
/// [`Outline::flush`]) computes the new visible list once per batch.
///
/// ## Example
///
/// ```rust
/// use understory_outline::{Outline, OutlineOptions, Record};
///
/// let mut outline = Outline::from_records(
///     OutlineOptions::default().forest(true),
///     [
///         Record::new(1001, "Folder A"),
///         Record::new(1002, "Grumpy Cats"),
///         Record::new(1003, "Grumpy's life").with_parent(1002),
///         Record::new(1004, "The cat's second birthday").with_parent(1002),
///     ],
/// );
/// assert_eq!(outline.commit().visible.len(), 4);
///
/// outline.collapse_all();
/// assert_eq!(outline.commit().visible.len(), 2);
///
/// let added = outline.add(Record::new(1010, "New root"), None, Some(0));
/// assert!(added.is_some());
/// assert_eq!(outline.get(1010).unwrap().label, "New root");
/// ```
pub struct Outline {
    pub(crate) table: NodeTable,
    pub(crate) layout: LayoutTree,
    pub(crate) options: OutlineOptions,
    pub(crate) orphans: Orphans,
    search: Option<Search>,
    selected: Option<NodeId>,
    pub(crate) drag: DragController,
    events: Vec<OutlineEvent>,
    /// visible list handed out by the last commit
    previous: Vec<NodeId>,
    /// records edited since the last commit
    touched: Vec<NodeId>,
    pub(crate) dirty: bool,
    animate: bool,
}

impl core::fmt::Debug for Outline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Outline")
            .field("table", &self.table)
            .field("layout_len", &self.layout.len())
            .field("roots", &self.layout.roots().len())
            .field("searching", &self.search.is_some())
            .field("selected", &self.selected)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Default for Outline {
    fn default() -> Self {
        Self::new(OutlineOptions::default())
    }
}

impl Outline {
    /// Create an empty outline awaiting records.
    pub fn new(options: OutlineOptions) -> Self {
        Self {
            table: NodeTable::new(),
            layout: LayoutTree::new(),
            options,
            orphans: Orphans::default(),
            search: None,
            selected: None,
            drag: DragController::default(),
            events: Vec::new(),
            previous: Vec::new(),
            touched: Vec::new(),
            dirty: true,
            animate: true,
        }
    }

    /// Ingest a complete, finite sequence of records and close the stream.
    pub fn from_records(options: OutlineOptions, records: impl IntoIterator<Item = Record>) -> Self {
        let mut outline = Self::new(options);
        for record in records {
            outline.push_record(record);
        }
        outline.finish();
        outline
    }

    // --- queries ---

    /// Active options.
    pub fn options(&self) -> &OutlineOptions {
        &self.options
    }

    /// The data side.
    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    /// The layout side.
    pub fn layout_tree(&self) -> &LayoutTree {
        &self.layout
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the outline holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolve any node reference to a live handle.
    pub fn resolve(&self, node: impl NodeRef) -> Option<NodeId> {
        node.resolve(&self.table)
    }

    /// The record of a node.
    pub fn get(&self, node: impl NodeRef) -> Option<&Record> {
        self.table.get(node.resolve(&self.table)?)
    }

    /// The layout state of a node.
    pub fn layout(&self, node: impl NodeRef) -> Option<&LayoutNode> {
        self.layout.get(node.resolve(&self.table)?)
    }

    /// The record id behind a handle.
    pub fn record_id(&self, id: NodeId) -> Option<&RecordId> {
        self.table.record_id(id)
    }

    /// The first root's record.
    pub fn root(&self) -> Option<&Record> {
        self.layout.roots().first().and_then(|id| self.table.get(*id))
    }

    /// Visible-eligible roots in order.
    pub fn roots(&self) -> &[NodeId] {
        self.layout.roots()
    }

    /// Handle of the selected node.
    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected
    }

    /// The selected node's record.
    pub fn selected(&self) -> Option<&Record> {
        self.table.get(self.selected?)
    }

    /// Whether a search is active.
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// The active search query.
    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(Search::query)
    }

    /// Handles of the active search's matches.
    pub fn search_matches(&self) -> &[NodeId] {
        self.search.as_ref().map(Search::matches).unwrap_or_default()
    }

    /// Whether drag gestures are accepted.
    pub fn is_editable(&self) -> bool {
        self.options.editable
    }

    /// Enable or disable drag gestures. Disabling cancels a drag in progress.
    pub fn set_editable(&mut self, editable: bool) {
        self.options.editable = editable;
        if !editable {
            self.drag_cancel();
        }
    }

    /// The current visible list, computed without committing.
    pub fn visible(&self) -> Vec<NodeId> {
        visible::resolve(&self.layout, self.search.as_ref().map(Search::keep))
    }

    /// The visible list handed out by the last commit.
    pub fn rendered(&self) -> &[NodeId] {
        &self.previous
    }

    /// Number of roots of either visibility.
    pub(crate) fn root_count(&self) -> usize {
        self.layout.roots().len() + self.layout.invisible_roots().len()
    }

    /// Whether the node is not a root: linked under a parent or waiting for one.
    fn has_parent_slot(&self, id: NodeId) -> bool {
        let node = self.layout.node(id);
        node.parent.is_some() || node.pending
    }

    /// Whether the node currently has a row: placed, visible, every ancestor
    /// open, and kept by the active search.
    pub(crate) fn is_shown(&self, id: NodeId) -> bool {
        let placed = |n: NodeId| {
            !self.layout.node(n).pending && self.table.get(n).is_some_and(Record::is_visible)
        };
        placed(id)
            && self
                .layout
                .ancestors(id)
                .all(|a| placed(a) && self.layout.node(a).is_expanded())
            && self.search.as_ref().is_none_or(|s| s.keep().contains(&id))
    }

    // --- mutations ---

    /// Insert a new record under `parent` (or as a root) at `index`.
    ///
    /// `index` defaults to the end of the parent's live list. The parent
    /// argument is authoritative over `record.parent_id`. Returns `None`, with
    /// no change, if the id is already present, the parent is unknown, or a
    /// second root would be created in single-root mode.
    pub fn add(
        &mut self,
        mut record: Record,
        parent: Option<&RecordId>,
        index: Option<usize>,
    ) -> Option<NodeId> {
        if self.table.lookup(&record.id).is_some() {
            tracing::debug!(id = %record.id, "add refused: duplicate id");
            return None;
        }
        let parent_node = match parent {
            None => None,
            Some(pid) => {
                let Some(p) = self.table.lookup(pid) else {
                    tracing::debug!(id = %record.id, parent = %pid, "add refused: unknown parent");
                    return None;
                };
                Some(p)
            }
        };
        if parent_node.is_none() && !self.options.forest && self.root_count() > 0 {
            tracing::debug!(id = %record.id, "add refused: outline has a single root");
            return None;
        }
        record.parent_id = parent.cloned();
        let key = record.id.clone();
        let visible = record.is_visible();
        let id = self.table.insert(record)?;
        self.layout.insert(id, parent_node.is_none());
        self.layout.attach(id, parent_node, index, visible);
        self.adopt_orphans(&key, id);
        self.refresh_search();
        self.dirty = true;
        Some(id)
    }

    /// Remove a node and its whole subtree from both tables.
    ///
    /// Returns `false` if the node is unknown.
    pub fn remove_node(&mut self, node: impl NodeRef) -> bool {
        let Some(id) = node.resolve(&self.table) else {
            tracing::debug!("remove refused: unknown node");
            return false;
        };
        self.layout.detach(id);
        let doomed = self.layout.subtree(id);
        for n in &doomed {
            if self.layout.node(*n).pending {
                self.orphans.forget(*n);
            }
            if self.selected == Some(*n) {
                self.selected = None;
            }
            self.layout.remove(*n);
            self.table.remove(*n);
        }
        if self
            .drag
            .source()
            .is_some_and(|s| !self.table.is_alive(s.node))
        {
            self.drag_cancel();
        }
        tracing::debug!(removed = doomed.len(), "removed subtree");
        self.refresh_search();
        self.dirty = true;
        true
    }

    /// Merge label and attributes into an existing record.
    ///
    /// Structural fields are ignored; the node keeps its visible position and
    /// is reported in the next frame's `updated` list. Returns `false` if the
    /// id is unknown.
    pub fn edit(&mut self, patch: &RecordPatch) -> bool {
        let Some(id) = self.table.lookup(&patch.id) else {
            tracing::debug!(id = %patch.id, "edit refused: unknown id");
            return false;
        };
        let Some(record) = self.table.get_mut(id) else {
            return false;
        };
        record.merge(patch);
        self.touched.push(id);
        if self.search.is_some() {
            self.refresh_search();
            self.dirty = true;
        }
        true
    }

    /// Apply [`Outline::edit`] and any `visible` transition for one record.
    pub fn patch_record(&mut self, patch: &RecordPatch) -> bool {
        if !self.edit(patch) {
            return false;
        }
        if let Some(visible) = patch.visible
            && let Some(id) = self.table.lookup(&patch.id)
        {
            self.set_visibility(id, visible);
        }
        true
    }

    /// Apply a batch of patches in order. Returns how many ids were known.
    pub fn patch<'a>(&mut self, patches: impl IntoIterator<Item = &'a RecordPatch>) -> usize {
        patches
            .into_iter()
            .filter(|p| self.patch_record(p))
            .count()
    }

    /// Apply streamed patches, handing a frame to `renderer` after each one.
    pub fn patch_stream<R: Renderer + ?Sized>(
        &mut self,
        patches: impl IntoIterator<Item = RecordPatch>,
        renderer: &mut R,
    ) -> usize {
        let mut applied = 0;
        for patch in patches {
            if self.patch_record(&patch) {
                applied += 1;
            }
            self.flush(renderer);
        }
        self.flush(renderer);
        applied
    }

    fn set_visibility(&mut self, id: NodeId, visible: bool) {
        let Some(record) = self.table.get_mut(id) else {
            return;
        };
        let was_visible = record.is_visible();
        record.visible = Some(visible);
        // Pending orphans pick their list when they are adopted.
        if was_visible == visible || self.layout.node(id).pending {
            return;
        }
        let Some(place) = self.layout.detach(id) else {
            return;
        };
        if visible {
            let table = &self.table;
            let siblings = self.layout.live_list_mut(place.parent);
            siblings.sort_by(|a, b| table.record_id(*a).cmp(&table.record_id(*b)));
            let key = table.record_id(id);
            let at = siblings.partition_point(|s| table.record_id(*s) < key);
            self.layout.attach(id, place.parent, Some(at), true);
        } else {
            self.layout.attach(id, place.parent, None, false);
        }
        self.refresh_search();
        self.dirty = true;
    }

    /// Reparent a node under `new_parent` (or into the root list) at `new_index`.
    ///
    /// Emits and returns a [`MoveEvent`]. Returns `None`, with no change and no
    /// event, if the node or parent is unknown, the destination lies inside the
    /// node's own subtree, or a second root would be created in single-root
    /// mode.
    pub fn move_node(
        &mut self,
        node: impl NodeRef,
        new_parent: Option<&RecordId>,
        new_index: usize,
    ) -> Option<MoveEvent> {
        let Some(id) = node.resolve(&self.table) else {
            tracing::debug!("move refused: unknown node");
            return None;
        };
        let parent = match new_parent {
            None => None,
            Some(pid) => {
                let Some(p) = self.table.lookup(pid) else {
                    tracing::debug!(parent = %pid, "move refused: unknown parent");
                    return None;
                };
                Some(p)
            }
        };
        self.move_to(id, parent, new_index)
    }

    /// Whether `id` may be placed under `parent`.
    pub(crate) fn can_move_to(&self, id: NodeId, parent: Option<NodeId>) -> bool {
        match parent {
            Some(p) => self.layout.is_alive(p) && !self.layout.is_within(p, id),
            None => self.options.forest || !self.has_parent_slot(id) || self.root_count() == 0,
        }
    }

    pub(crate) fn move_to(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        index: usize,
    ) -> Option<MoveEvent> {
        if !self.can_move_to(id, parent) {
            tracing::debug!(?id, ?parent, "move refused: cycle or second root");
            return None;
        }
        if self.layout.node(id).pending {
            self.orphans.forget(id);
        }
        let visible = self.table.get(id)?.is_visible();
        let previous = self.layout.detach(id);
        let new_index = self.layout.attach(id, parent, Some(index), visible);

        let new_parent = parent.and_then(|p| self.table.record_id(p)).cloned();
        let previous_parent = previous
            .and_then(|p| p.parent)
            .and_then(|p| self.table.record_id(p))
            .cloned();
        let record = self.table.get_mut(id)?;
        record.parent_id.clone_from(&new_parent);
        let event = MoveEvent {
            node: id,
            id: record.id.clone(),
            new_parent,
            previous_parent,
            new_index,
            previous_index: previous.map_or(0, |p| p.index),
        };
        self.events.push(OutlineEvent::Move(event.clone()));
        self.refresh_search();
        self.dirty = true;
        Some(event)
    }

    /// Flip a node between expanded and collapsed.
    ///
    /// Returns `false` for unknown nodes and nodes without children.
    pub fn toggle(&mut self, node: impl NodeRef) -> bool {
        let Some(id) = node.resolve(&self.table) else {
            tracing::debug!("toggle refused: unknown node");
            return false;
        };
        let n = self.layout.node(id);
        if !n.has_children() {
            return false;
        }
        let expanded = !n.is_expanded();
        self.layout.set_expanded(id, expanded);
        self.dirty = true;
        true
    }

    /// Expand every node.
    pub fn expand_all(&mut self) {
        let ids: Vec<NodeId> = self.layout.ids().collect();
        for id in ids {
            self.layout.set_expanded(id, true);
        }
        self.dirty = true;
    }

    /// Collapse every node. In single-root mode the roots stay expanded.
    pub fn collapse_all(&mut self) {
        let keep_roots = !self.options.forest;
        let ids: Vec<NodeId> = self.layout.ids().collect();
        for id in ids {
            if keep_roots && !self.has_parent_slot(id) {
                continue;
            }
            self.layout.set_expanded(id, false);
        }
        self.dirty = true;
    }

    /// Select a node and reveal it.
    ///
    /// Leaves search mode first, expands every ancestor, and expands the node
    /// itself when `toggle_on_select` is set and it is collapsed. Emits a
    /// select event unless `silent`. Returns `false` for unknown nodes.
    pub fn select(&mut self, node: impl NodeRef, options: SelectOptions) -> bool {
        let Some(id) = node.resolve(&self.table) else {
            tracing::debug!("select refused: unknown node");
            return false;
        };
        self.clear_search();

        let ancestors: Vec<NodeId> = self.layout.ancestors(id).collect();
        let was_hidden = ancestors.iter().any(|a| !self.layout.node(*a).is_expanded());
        if let Some(prev) = self.selected.take()
            && let Some(n) = self.layout.get_mut(prev)
        {
            n.flags.remove(LayoutFlags::SELECTED);
        }
        self.layout.node_mut(id).flags.insert(LayoutFlags::SELECTED);
        self.selected = Some(id);

        for a in ancestors {
            self.layout.set_expanded(a, true);
        }
        if options.toggle_on_select && self.layout.node(id).has_children() {
            self.layout.set_expanded(id, true);
        }
        if !options.animate || was_hidden {
            self.animate = false;
        }
        if !options.silent
            && let Some(record_id) = self.table.record_id(id)
        {
            self.events.push(OutlineEvent::Select {
                node: id,
                id: record_id.clone(),
            });
        }
        self.dirty = true;
        true
    }

    /// Filter the view by `query`, or clear the filter with `None` / `""`.
    ///
    /// Clearing restores the expand state captured when the search began.
    /// Repeating a query is idempotent. Returns `false` only for a clear while
    /// no search is active.
    pub fn search(&mut self, query: Option<&str>) -> bool {
        match query.filter(|q| !q.is_empty()) {
            None => self.clear_search(),
            Some(q) => {
                let snapshot = match self.search.take() {
                    Some(active) => active.finish(&mut self.layout),
                    None => ExpansionSnapshot::capture(&self.layout),
                };
                self.search = Some(Search::begin(
                    &self.table,
                    &mut self.layout,
                    q,
                    &self.options,
                    snapshot,
                ));
                self.dirty = true;
                true
            }
        }
    }

    fn clear_search(&mut self) -> bool {
        let Some(active) = self.search.take() else {
            return false;
        };
        active.finish(&mut self.layout);
        self.dirty = true;
        true
    }

    /// Re-run the active search after a mutation, keeping its snapshot.
    pub(crate) fn refresh_search(&mut self) {
        if let Some(search) = self.search.as_mut() {
            search.refresh(&self.table, &mut self.layout, &self.options);
        }
    }

    // --- events and presentation ---

    /// Take the notifications emitted since the last call (or flush).
    pub fn take_events(&mut self) -> Vec<OutlineEvent> {
        core::mem::take(&mut self.events)
    }

    /// Forward a renderer request to the matching operation.
    ///
    /// Returns whether the request had an effect.
    pub fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Toggle(id) => self.toggle(id),
            Request::Select(id, options) => self.select(id, options),
            Request::DragStart(id, offset) => self.drag_start(id, offset),
            Request::Drag(target) => self.drag_over(target),
            Request::DragEnd => self.drag_end().is_some(),
            Request::DragCancel => self.drag_cancel(),
        }
    }

    /// Whether anything changed since the last commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty || !self.touched.is_empty()
    }

    /// Recompute the visible list and summarize what changed.
    ///
    /// Events stay queued until [`Outline::flush`] or [`Outline::take_events`]
    /// drains them; hosts that only commit should take them alongside.
    pub fn commit(&mut self) -> Frame {
        let visible = self.visible();
        let mut frame = Frame::diff(&self.previous, visible, &self.touched);
        frame.searching = self.search.is_some();
        frame.detached_root = if frame.searching {
            None
        } else {
            self.options.root_height
        };
        let count = frame.visible.len().max(self.previous.len());
        frame.animate = self.animate && self.options.max_animatable.is_none_or(|m| count <= m);
        tracing::trace!(
            visible = frame.visible.len(),
            entered = frame.entered.len(),
            exited = frame.exited.len(),
            moved = frame.moved.len(),
            "commit"
        );
        self.previous.clone_from(&frame.visible);
        self.touched.clear();
        self.dirty = false;
        self.animate = true;
        frame
    }

    /// Deliver pending events, then render a frame if anything changed.
    ///
    /// Returns `true` if a frame was rendered.
    pub fn flush<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> bool {
        for event in self.events.drain(..) {
            renderer.notify(&event);
        }
        if !self.is_dirty() {
            return false;
        }
        let frame = self.commit();
        renderer.render(&frame);
        true
    }
}
