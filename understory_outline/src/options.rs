// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline configuration.

use alloc::string::String;
use alloc::vec::Vec;

/// Options recognized by an [`Outline`](crate::Outline).
///
/// ```rust
/// use understory_outline::OutlineOptions;
///
/// let options = OutlineOptions::default()
///     .forest(true)
///     .max_animatable(Some(200))
///     .search_field("nodeType");
/// assert!(options.forest);
/// assert_eq!(options.search_fields, ["nodeType"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OutlineOptions {
    /// Allow multiple roots. When `false`, `add` and `move` refuse to create a
    /// second root and `collapse_all` keeps the root expanded.
    pub forest: bool,
    /// Frames whose old or new visible count exceeds this are not animated.
    pub max_animatable: Option<usize>,
    /// Height of a detached root row. Renderer-only; echoed in frames while
    /// not searching.
    pub root_height: Option<f64>,
    /// Whether drag gestures are accepted.
    pub editable: bool,
    /// Match search queries case-sensitively.
    pub case_sensitive_search: bool,
    /// Attribute keys searched in addition to the label.
    pub search_fields: Vec<String>,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            forest: false,
            max_animatable: None,
            root_height: None,
            editable: false,
            case_sensitive_search: false,
            search_fields: Vec::new(),
        }
    }
}

impl OutlineOptions {
    /// Allow or forbid multiple roots.
    #[must_use]
    pub fn forest(mut self, forest: bool) -> Self {
        self.forest = forest;
        self
    }

    /// Set the animation threshold.
    #[must_use]
    pub fn max_animatable(mut self, max: Option<usize>) -> Self {
        self.max_animatable = max;
        self
    }

    /// Set the detached root height.
    #[must_use]
    pub fn root_height(mut self, height: Option<f64>) -> Self {
        self.root_height = height;
        self
    }

    /// Start editable (drag enabled).
    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Match search queries case-sensitively.
    #[must_use]
    pub fn case_sensitive_search(mut self, sensitive: bool) -> Self {
        self.case_sensitive_search = sensitive;
        self
    }

    /// Also search the string value of attribute `key`.
    #[must_use]
    pub fn search_field(mut self, key: impl Into<String>) -> Self {
        self.search_fields.push(key.into());
        self
    }
}

/// Options for [`Outline::select`](crate::Outline::select).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectOptions {
    /// Do not emit a select event.
    pub silent: bool,
    /// Expand the selected node if it is collapsed. Never collapses.
    pub toggle_on_select: bool,
    /// Allow the next frame to animate.
    pub animate: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            silent: false,
            toggle_on_select: true,
            animate: true,
        }
    }
}

impl SelectOptions {
    /// Suppress the select event.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Leave the selected node's own expand state alone.
    #[must_use]
    pub fn without_toggle(mut self) -> Self {
        self.toggle_on_select = false;
        self
    }

    /// Ask for an unanimated transition.
    #[must_use]
    pub fn without_animation(mut self) -> Self {
        self.animate = false;
        self
    }
}
