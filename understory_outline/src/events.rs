// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine ↔ renderer contract: notifications out, requests in.

use kurbo::Vec2;

use crate::drag::DropTarget;
use crate::frame::Frame;
use crate::options::SelectOptions;
use crate::record::RecordId;
use crate::types::NodeId;

/// A completed relocation.
///
/// Indices are positions in the parent's list the node belongs to: its
/// children (hidden or shown) for a visible node, and its invisible list for
/// a record with `visible: false`. A node that was still waiting for its
/// parent reports `previous_index` 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveEvent {
    /// Handle of the moved node.
    pub node: NodeId,
    /// Record id of the moved node.
    pub id: RecordId,
    /// Parent after the move, `None` for the root list.
    pub new_parent: Option<RecordId>,
    /// Parent before the move, `None` for the root list.
    pub previous_parent: Option<RecordId>,
    /// Index in the destination list.
    pub new_index: usize,
    /// Index in the source list.
    pub previous_index: usize,
}

/// Notifications emitted by an [`Outline`](crate::Outline).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutlineEvent {
    /// A node was selected.
    Select {
        /// Handle of the selected node.
        node: NodeId,
        /// Record id of the selected node.
        id: RecordId,
    },
    /// A node was moved.
    Move(MoveEvent),
}

/// Display surface driven by [`Outline::flush`](crate::Outline::flush).
///
/// The engine never waits on a renderer: animation timing and completion are
/// the renderer's own business.
pub trait Renderer {
    /// Reconcile the display against a new frame.
    fn render(&mut self, frame: &Frame);

    /// Receive a notification. Called before the frame it belongs to.
    fn notify(&mut self, event: &OutlineEvent) {
        let _ = event;
    }
}

/// Input forwarded from a renderer, already resolved to node handles.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Expand or collapse a node.
    Toggle(NodeId),
    /// Select a node.
    Select(NodeId, SelectOptions),
    /// Begin dragging a node; the vector is the pointer offset within its row.
    DragStart(NodeId, Vec2),
    /// The pointer now resolves to this candidate placement.
    Drag(DropTarget),
    /// Release: commit the last valid candidate.
    DragEnd,
    /// Abort the gesture with no structural effect.
    DragCancel,
}
