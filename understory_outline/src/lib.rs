// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Outline: incremental tree-view state for UIs.
//!
//! Understory Outline turns a stream of flat, parent-referencing records into
//! an interactive hierarchy and keeps the UI state of that hierarchy consistent
//! under arbitrary mutation.
//!
//! - Assembles a forest from records that may arrive in any order, buffering
//!   children until their parent shows up.
//! - Maintains a layout tree decorated with expand/collapse, selection, and
//!   search state next to the canonical data records.
//! - Computes the ordered list of visible rows in time proportional to the
//!   number of visible rows.
//! - Filters by search while overriding collapse state, and restores it exactly
//!   when the search ends.
//! - Relocates subtrees through a drag gesture with cycle suppression and
//!   move notifications.
//!
//! ## Not a widget
//!
//! This crate draws nothing. A [`Renderer`] receives a [`Frame`] per batch of
//! mutations (the visible rows plus what entered, exited, moved, or changed)
//! and is free to animate however it likes. Input comes back as [`Request`]s
//! already resolved to [`NodeId`]s. Pixel geometry only appears in
//! [`RowDropResolver`], an optional helper for fixed-height rows.
//!
//! ## API overview
//!
//! - [`Outline`]: owns the [`NodeTable`] and [`LayoutTree`] pair and funnels
//!   every mutation through one synchronous API.
//! - [`Record`] / [`RecordPatch`]: data records and partial updates, with an
//!   open bag of JSON attributes.
//! - [`NodeId`]: generational handle shared by a record and its layout node.
//!   Any [`NodeRef`] (a handle, a [`RecordId`], an integer, or a string) can
//!   name a node.
//! - [`OutlineOptions`]: forest vs single-root mode, animation threshold,
//!   search behaviour, and whether drags are accepted.
//!
//! Key operations:
//! - [`Outline::push_record`] / [`Outline::finish`] (or [`Outline::ingest`]) for streamed records.
//! - [`Outline::add`], [`Outline::remove_node`], [`Outline::edit`], [`Outline::patch`],
//!   and [`Outline::move_node`].
//! - [`Outline::toggle`], [`Outline::expand_all`], [`Outline::collapse_all`], and [`Outline::select`].
//! - [`Outline::search`] to filter, `search(None)` to restore.
//! - [`Outline::drag_start`], [`Outline::drag_over`] / [`Outline::drag_to`], [`Outline::drag_end`],
//!   and [`Outline::drag_cancel`].
//! - [`Outline::commit`] → [`Frame`], or [`Outline::flush`] to hand events and
//!   the frame to a [`Renderer`].
//!
//! ## Example
//!
//! ```rust
//! use understory_outline::{Outline, OutlineOptions, Record, RecordId, SelectOptions};
//!
//! let mut outline = Outline::new(OutlineOptions::default().forest(true));
//!
//! // Children may arrive before their parent.
//! outline.push_record(Record::new(1003, "Grumpy's life").with_parent(1002));
//! outline.push_record(Record::new(1001, "Folder A"));
//! outline.push_record(Record::new(1002, "Grumpy Cats"));
//! outline.finish();
//!
//! let frame = outline.commit();
//! assert_eq!(frame.visible.len(), 3);
//!
//! outline.search(Some("life"));
//! assert_eq!(outline.commit().visible.len(), 2);
//! outline.search(None);
//!
//! outline.move_node(1003, None, 0).unwrap();
//! assert_eq!(outline.root().unwrap().id, RecordId::Int(1003));
//!
//! outline.select(1002, SelectOptions::default());
//! assert_eq!(outline.selected().unwrap().label, "Grumpy Cats");
//! ```
//!
//! ## Batching
//!
//! Mutations only mark the outline dirty; the visible list is recomputed once
//! per [`Outline::commit`]. The streaming helpers [`Outline::ingest`] and
//! [`Outline::patch_stream`] flush after every record and once after the
//! stream ends, so each record gets its own hand-off.
//!
//! ## Logging
//!
//! Refused operations are reported at `debug` level and ingestion anomalies at
//! `warn` level through [`tracing`]. The crate never installs a subscriber.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod drag;
mod events;
mod frame;
mod ingest;
mod layout;
mod options;
mod outline;
mod record;
mod search;
mod table;
mod types;
mod visible;

pub use drag::{DragController, DragPhase, DragSource, DropResolver, DropTarget, RowDropResolver};
pub use events::{MoveEvent, OutlineEvent, Renderer, Request};
pub use frame::Frame;
pub use ingest::RecordSink;
pub use layout::{LayoutNode, LayoutTree};
pub use options::{OutlineOptions, SelectOptions};
pub use outline::Outline;
pub use record::{Record, RecordError, RecordId, RecordPatch};
pub use table::{NodeRef, NodeTable};
pub use types::{LayoutFlags, NodeId};
