// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the outline: node handles and layout flags.

/// Handle to a node in an [`Outline`](crate::Outline) (generational).
///
/// Data records and layout nodes share the same handle. A handle goes stale
/// when its node is removed; if the slot is reused later the generation is
/// bumped, so stale handles never alias a new node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// UI state carried by a layout node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LayoutFlags: u8 {
        /// Children are live (`children` populated, `hidden_children` empty).
        const EXPANDED     = 0b0000_0001;
        /// Node is the current selection.
        const SELECTED     = 0b0000_0010;
        /// Node matches the active search query.
        const SEARCH_MATCH = 0b0000_0100;
    }
}
