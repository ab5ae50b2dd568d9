// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat records: the data side of the outline.
//!
//! A [`Record`] carries the structural fields the engine understands (`id`,
//! `parentId`, `visible`), a `label`, and an open bag of presentation
//! attributes the engine never interprets.

use alloc::string::{String, ToString};
use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Attribute keys that are structural and never merged into the attribute bag.
const STRUCTURAL_KEYS: [&str; 4] = ["id", "parentId", "visible", "label"];

/// Stable identifier of a record.
///
/// Integers order before strings; within a kind the natural order applies.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric identifier (JSON integer).
    Int(i64),
    /// Textual identifier (JSON string).
    Str(String),
}

impl RecordId {
    /// Interpret a JSON value as an identifier.
    ///
    /// Returns `None` for anything but integers and strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for RecordId {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Reasons a raw record cannot be accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record has no `id` (or a null one).
    #[error("record has no id")]
    MissingId,
    /// The `id` is neither an integer nor a string.
    #[error("record id must be an integer or a string")]
    InvalidId,
    /// The payload does not have the shape of a record.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A flat, parent-referencing data record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique, immutable identifier.
    pub id: RecordId,
    /// Identifier of the parent record; `None` for roots.
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,
    /// Display label, also the default search text.
    #[serde(default)]
    pub label: String,
    /// `Some(false)` keeps the node out of every visible list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Presentation attributes the engine does not interpret.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Create a root record with a label and no attributes.
    pub fn new(id: impl Into<RecordId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            label: label.into(),
            visible: None,
            attributes: Map::new(),
        }
    }

    /// Set the parent identifier.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<RecordId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set the `visible` flag.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Add a presentation attribute. Structural keys are ignored.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !STRUCTURAL_KEYS.contains(&key.as_str()) {
            self.attributes.insert(key, value.into());
        }
        self
    }

    /// Parse a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingId`] when `id` is absent or null,
    /// [`RecordError::InvalidId`] when it is not an integer or string, and
    /// [`RecordError::Malformed`] for any other shape problem.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let map = checked_object(value)?;
        serde_json::from_value(Value::Object(map))
            .map_err(|e| RecordError::Malformed(e.to_string()))
    }

    /// Parse a record from JSON text. See [`Record::from_value`].
    ///
    /// # Errors
    ///
    /// Same as [`Record::from_value`], plus [`RecordError::Malformed`] for
    /// invalid JSON.
    pub fn from_json(text: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RecordError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Whether the record may appear in visible lists.
    pub fn is_visible(&self) -> bool {
        self.visible != Some(false)
    }

    /// Look up a presentation attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Merge label and attributes from `patch`. Structural fields are untouched.
    pub(crate) fn merge(&mut self, patch: &RecordPatch) {
        if let Some(label) = &patch.label {
            self.label.clone_from(label);
        }
        for (key, value) in &patch.attributes {
            if STRUCTURAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Whether `needle` occurs in the label or any of `fields`.
    ///
    /// `needle` is matched literally. When `fold_case` is set both sides are
    /// lowercased and `needle` is expected to be lowercase already.
    pub(crate) fn contains_text(&self, needle: &str, fields: &[String], fold_case: bool) -> bool {
        let hit = |text: &str| {
            if fold_case {
                text.to_lowercase().contains(needle)
            } else {
                text.contains(needle)
            }
        };
        if hit(&self.label) {
            return true;
        }
        fields
            .iter()
            .filter_map(|f| self.attributes.get(f))
            .filter_map(Value::as_str)
            .any(hit)
    }
}

/// A partial update keyed by an existing record id.
///
/// Used by [`Outline::edit`](crate::Outline::edit) and
/// [`Outline::patch`](crate::Outline::patch).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// Identifier of the record to update.
    pub id: RecordId,
    /// New label, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New visibility, if changing. Only [`Outline::patch`](crate::Outline::patch) acts on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Attributes to merge.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RecordPatch {
    /// An empty patch for `id`.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            visible: None,
            attributes: Map::new(),
        }
    }

    /// Change the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Change visibility.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Set an attribute. Structural keys are ignored.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !STRUCTURAL_KEYS.contains(&key.as_str()) {
            self.attributes.insert(key, value.into());
        }
        self
    }

    /// Parse a patch from a JSON value. A `parentId` key is discarded.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Record::from_value`].
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let mut map = checked_object(value)?;
        map.remove("parentId");
        serde_json::from_value(Value::Object(map))
            .map_err(|e| RecordError::Malformed(e.to_string()))
    }
}

impl From<&Record> for RecordPatch {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            label: Some(record.label.clone()),
            visible: record.visible,
            attributes: record.attributes.clone(),
        }
    }
}

fn checked_object(value: Value) -> Result<Map<String, Value>, RecordError> {
    let Value::Object(map) = value else {
        return Err(RecordError::Malformed("expected a JSON object".to_string()));
    };
    match map.get("id") {
        None | Some(Value::Null) => Err(RecordError::MissingId),
        Some(id) if RecordId::from_json(id).is_none() => Err(RecordError::InvalidId),
        Some(_) => Ok(map),
    }
}
