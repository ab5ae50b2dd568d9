// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop reparenting.
//!
//! A gesture moves through `Idle → Dragging → {Committed, Cancelled}`. While
//! dragging, the dragged node stays structurally in place; the controller only
//! tracks the last valid [`DropTarget`]. Releasing commits that target through
//! [`Outline::move_node`]'s machinery and emits the usual move event.
//!
//! Turning pointer positions into drop targets depends on how rows are drawn,
//! so it sits behind the [`DropResolver`] trait. [`RowDropResolver`] covers the
//! common case of fixed-height rows indented by depth.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Vec2};
//! use understory_outline::{Outline, OutlineOptions, Record, RowDropResolver};
//!
//! let mut outline = Outline::from_records(
//!     OutlineOptions::default().forest(true).editable(true),
//!     [
//!         Record::new(1001, "Folder A"),
//!         Record::new(1002, "Grumpy Cats"),
//!         Record::new(1003, "Grumpy's life").with_parent(1002),
//!     ],
//! );
//! outline.commit();
//!
//! let rows = RowDropResolver::new(36.0, 20.0);
//! assert!(outline.drag_start(1003, Vec2::new(4.0, 4.0)));
//! outline.drag_to(Point::new(0.0, 5.0), &rows);
//! let moved = outline.drag_end().unwrap();
//! assert_eq!(moved.new_parent, None);
//! assert_eq!(moved.new_index, 0);
//! ```

use kurbo::{Point, Vec2};

use crate::events::MoveEvent;
use crate::outline::Outline;
use crate::table::NodeRef;
use crate::types::NodeId;

/// Where a dragged node would land if released now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropTarget {
    /// New parent, `None` for the root list.
    pub parent: Option<NodeId>,
    /// Index in the parent's list once the dragged node has been taken out.
    pub index: usize,
}

impl DropTarget {
    /// A target in the root list.
    pub fn root(index: usize) -> Self {
        Self {
            parent: None,
            index,
        }
    }

    /// A target under `parent`.
    pub fn under(parent: NodeId, index: usize) -> Self {
        Self {
            parent: Some(parent),
            index,
        }
    }
}

/// Phase of the drag gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    /// No gesture.
    #[default]
    Idle,
    /// A node is being dragged.
    Dragging,
    /// The last gesture ended with a move.
    Committed,
    /// The last gesture ended without a valid target.
    Cancelled,
}

/// Where the dragged node started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSource {
    /// The dragged node.
    pub node: NodeId,
    /// Its parent when the gesture began.
    pub parent: Option<NodeId>,
    /// Its index in the parent's list when the gesture began.
    pub index: usize,
    /// Pointer position relative to the dragged row, for the renderer.
    pub pointer_offset: Vec2,
}

/// State of the current or last drag gesture.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    phase: DragPhase,
    source: Option<DragSource>,
    candidate: Option<DropTarget>,
}

impl DragController {
    /// Current phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Returns `true` while a node is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// The node being dragged and where it started.
    pub fn source(&self) -> Option<&DragSource> {
        self.source.as_ref()
    }

    /// The last valid drop target.
    pub fn candidate(&self) -> Option<DropTarget> {
        self.candidate
    }

    fn end(&mut self, phase: DragPhase) {
        self.phase = phase;
        self.source = None;
        self.candidate = None;
    }
}

/// Turns pointer state into a candidate placement.
pub trait DropResolver {
    /// Resolve `pointer` to a drop target for `dragged`, or `None` if the
    /// pointer does not designate one.
    fn resolve(&self, outline: &Outline, dragged: NodeId, pointer: Point) -> Option<DropTarget>;
}

/// Drop resolver for fixed-height rows indented by depth.
///
/// Rows are the last committed visible list minus the dragged subtree, laid
/// out top to bottom from `origin`. The pointer's `y` picks the gap between
/// two rows; its `x` picks the depth, clamped to what that gap allows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowDropResolver {
    /// Height of every row.
    pub row_height: f64,
    /// Horizontal offset per depth level.
    pub indent: f64,
    /// Top-left corner of the first row.
    pub origin: Point,
}

impl RowDropResolver {
    /// Create a resolver with its first row at the origin.
    pub fn new(row_height: f64, indent: f64) -> Self {
        Self {
            row_height,
            indent,
            origin: Point::ZERO,
        }
    }

    /// Move the first row to `origin`.
    #[must_use]
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Float to usize casts saturate; negative positions clamp to zero."
)]
fn steps(offset: f64, step: f64) -> usize {
    if step > 0.0 { (offset / step) as usize } else { 0 }
}

impl DropResolver for RowDropResolver {
    fn resolve(&self, outline: &Outline, dragged: NodeId, pointer: Point) -> Option<DropTarget> {
        let layout = outline.layout_tree();
        let rows: alloc::vec::Vec<NodeId> = outline
            .rendered()
            .iter()
            .copied()
            .filter(|r| layout.is_alive(*r) && !layout.is_within(*r, dragged))
            .collect();
        let local = pointer - self.origin;
        // Nearest gap between rows.
        let gap = steps(local.y + self.row_height / 2.0, self.row_height).min(rows.len());
        if gap == 0 {
            return Some(DropTarget::root(0));
        }
        let above = rows[gap - 1];
        let above_depth = layout.depth(above);
        let below_depth = rows.get(gap).map_or(0, |b| layout.depth(*b));
        let depth = steps(local.x, self.indent).clamp(below_depth, above_depth + 1);
        if depth == above_depth + 1 {
            return Some(DropTarget::under(above, 0));
        }
        let mut anchor = above;
        for _ in depth..above_depth {
            anchor = layout.parent_of(anchor)?;
        }
        let parent = layout.parent_of(anchor);
        let index = layout
            .live_list(parent)
            .iter()
            .filter(|s| **s != dragged)
            .position(|s| *s == anchor)?;
        Some(DropTarget {
            parent,
            index: index + 1,
        })
    }
}

impl Outline {
    /// The drag controller.
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Begin dragging `node`.
    ///
    /// Refused unless the outline is editable, no drag is in progress, and the
    /// node has a row in the visible list. A node hidden under a collapsed
    /// ancestor or filtered out by a search must be revealed first.
    pub fn drag_start(&mut self, node: impl NodeRef, pointer_offset: Vec2) -> bool {
        if !self.options.editable {
            tracing::debug!("drag refused: outline is not editable");
            return false;
        }
        if self.drag.is_dragging() {
            return false;
        }
        let Some(id) = node.resolve(&self.table) else {
            return false;
        };
        if !self.is_shown(id) {
            tracing::debug!(?id, "drag refused: node has no row");
            return false;
        }
        let parent = self.layout.parent_of(id);
        let index = self
            .layout
            .live_list(parent)
            .iter()
            .position(|s| *s == id)
            .unwrap_or(0);
        self.drag = DragController {
            phase: DragPhase::Dragging,
            source: Some(DragSource {
                node: id,
                parent,
                index,
                pointer_offset,
            }),
            candidate: None,
        };
        true
    }

    /// Offer a candidate placement for the dragged node.
    ///
    /// Targets inside the dragged subtree, under a dead node, or creating a
    /// second root in single-root mode are ignored; the last valid candidate
    /// is kept. Returns whether `target` was accepted.
    pub fn drag_over(&mut self, target: DropTarget) -> bool {
        let Some(source) = self.drag.source else {
            return false;
        };
        if !self.can_move_to(source.node, target.parent) {
            tracing::debug!(?target, "drop target suppressed");
            return false;
        }
        self.drag.candidate = Some(target);
        true
    }

    /// Resolve `pointer` with `resolver` and offer the result as a candidate.
    pub fn drag_to(&mut self, pointer: Point, resolver: &impl DropResolver) -> bool {
        let Some(source) = self.drag.source else {
            return false;
        };
        match resolver.resolve(self, source.node, pointer) {
            Some(target) => self.drag_over(target),
            None => false,
        }
    }

    /// Release: move the dragged node to the last valid candidate.
    ///
    /// Without a candidate (or if it went stale) the gesture is cancelled with
    /// no structural change.
    pub fn drag_end(&mut self) -> Option<MoveEvent> {
        let source = self.drag.source?;
        let moved = self
            .drag
            .candidate
            .and_then(|t| self.move_to(source.node, t.parent, t.index));
        let phase = if moved.is_some() {
            DragPhase::Committed
        } else {
            DragPhase::Cancelled
        };
        self.drag.end(phase);
        moved
    }

    /// Abort the gesture with no structural effect.
    ///
    /// Returns `false` if no drag was in progress.
    pub fn drag_cancel(&mut self) -> bool {
        if !self.drag.is_dragging() {
            return false;
        }
        self.drag.end(DragPhase::Idle);
        true
    }
}
