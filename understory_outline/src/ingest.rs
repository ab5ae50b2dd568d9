// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Streamed ingestion with orphan buffering.
//!
//! Records arrive one at a time through [`Outline::push_record`] (or the
//! [`RecordSink`] trait) and are inserted synchronously. A record whose parent
//! has not arrived yet is stored in both tables but left unlinked, waiting in a
//! per-parent buffer. When the parent arrives the waiting children are attached
//! in arrival order. [`Outline::finish`] closes the stream and promotes every
//! child still waiting to a root.

use alloc::vec::Vec;

use hashbrown::HashMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::events::Renderer;
use crate::outline::Outline;
use crate::record::{Record, RecordError, RecordId};
use crate::types::NodeId;

/// Children waiting for a parent id that has not been seen yet.
#[derive(Clone, Debug, Default)]
pub(crate) struct Orphans {
    by_parent: HashMap<RecordId, SmallVec<[(u64, NodeId); 2]>>,
    arrivals: u64,
    finished: bool,
}

impl Orphans {
    fn hold(&mut self, parent: RecordId, id: NodeId) {
        let seq = self.arrivals;
        self.arrivals += 1;
        self.by_parent.entry(parent).or_default().push((seq, id));
    }

    /// Take the children waiting on `parent`, in arrival order.
    fn release(&mut self, parent: &RecordId) -> SmallVec<[(u64, NodeId); 2]> {
        self.by_parent.remove(parent).unwrap_or_default()
    }

    /// Stop waiting for `id` (it was removed or moved explicitly).
    pub(crate) fn forget(&mut self, id: NodeId) {
        self.by_parent.retain(|_, waiting| {
            waiting.retain(|(_, n)| *n != id);
            !waiting.is_empty()
        });
    }

    /// Take every waiting child across all parents, in arrival order.
    fn drain(&mut self) -> Vec<NodeId> {
        let mut all: Vec<(u64, NodeId)> = self
            .by_parent
            .drain()
            .flat_map(|(_, waiting)| waiting)
            .collect();
        all.sort_unstable_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, id)| id).collect()
    }

    fn len(&self) -> usize {
        self.by_parent.values().map(SmallVec::len).sum()
    }
}

/// Push-based consumer of a record stream with an explicit end signal.
pub trait RecordSink {
    /// Consume one record.
    fn on_record(&mut self, record: Record);

    /// The stream ended; no further records will follow.
    fn on_end(&mut self);
}

impl RecordSink for Outline {
    fn on_record(&mut self, record: Record) {
        self.push_record(record);
    }

    fn on_end(&mut self) {
        self.finish();
    }
}

impl Outline {
    /// Insert one streamed record.
    ///
    /// Attaches it under its parent if the parent is known, otherwise holds it
    /// until the parent arrives or the stream ends. Returns the new handle, or
    /// `None` if the record was dropped: a duplicate id (the first record
    /// wins) or a record arriving after [`Outline::finish`].
    pub fn push_record(&mut self, mut record: Record) -> Option<NodeId> {
        if self.orphans.finished {
            tracing::warn!(id = %record.id, "record after end of stream ignored");
            return None;
        }
        if self.table.lookup(&record.id).is_some() {
            tracing::warn!(id = %record.id, "duplicate id during ingest, keeping the first");
            return None;
        }
        if record.parent_id.as_ref() == Some(&record.id) {
            tracing::warn!(id = %record.id, "record names itself as parent, treating as root");
            record.parent_id = None;
        }
        let key = record.id.clone();
        let parent_key = record.parent_id.clone();
        let visible = record.is_visible();
        if parent_key.is_none() && !self.options.forest && self.root_count() > 0 {
            tracing::warn!(id = %key, "extra root in a single-root outline");
        }

        let id = self.table.insert(record)?;
        match parent_key {
            None => {
                self.layout.insert(id, true);
                self.layout.attach(id, None, None, visible);
            }
            Some(parent_key) => {
                self.layout.insert(id, false);
                if let Some(parent) = self.table.lookup(&parent_key) {
                    self.layout.attach(id, Some(parent), None, visible);
                } else {
                    self.layout.node_mut(id).pending = true;
                    self.orphans.hold(parent_key, id);
                }
            }
        }
        self.adopt_orphans(&key, id);
        self.refresh_search();
        self.dirty = true;
        Some(id)
    }

    /// Parse and insert one JSON record.
    ///
    /// A malformed record is reported and leaves the outline untouched, so a
    /// caller can skip it and keep streaming.
    pub fn push_value(&mut self, value: Value) -> Result<Option<NodeId>, RecordError> {
        match Record::from_value(value) {
            Ok(record) => Ok(self.push_record(record)),
            Err(err) => {
                tracing::warn!(%err, "malformed record dropped");
                Err(err)
            }
        }
    }

    /// Close the stream and promote every orphan still waiting to a root.
    ///
    /// Returns the number of promoted orphans. Calling it again is a no-op.
    pub fn finish(&mut self) -> usize {
        if self.orphans.finished {
            return 0;
        }
        self.orphans.finished = true;
        let stranded = self.orphans.drain();
        for &id in &stranded {
            self.promote(id);
        }
        if !stranded.is_empty() {
            self.refresh_search();
        }
        stranded.len()
    }

    /// Whether the record stream has ended.
    pub fn is_finished(&self) -> bool {
        self.orphans.finished
    }

    /// Number of records still waiting for their parent.
    pub fn pending_orphans(&self) -> usize {
        self.orphans.len()
    }

    /// Consume a whole stream, handing a frame to `renderer` after each record
    /// and once more after the end signal.
    ///
    /// Returns the number of records inserted.
    pub fn ingest<R: Renderer + ?Sized>(
        &mut self,
        records: impl IntoIterator<Item = Record>,
        renderer: &mut R,
    ) -> usize {
        let mut inserted = 0;
        for record in records {
            if self.push_record(record).is_some() {
                inserted += 1;
            }
            self.flush(renderer);
        }
        self.finish();
        self.flush(renderer);
        inserted
    }

    /// Attach the orphans waiting on `key`, which has just arrived as `id`.
    pub(crate) fn adopt_orphans(&mut self, key: &RecordId, id: NodeId) {
        for (_, child) in self.orphans.release(key) {
            // The parent may hang below the waiting child.
            if self.layout.is_within(id, child) {
                tracing::warn!(parent = %key, "orphan would close a cycle");
                self.promote(child);
                continue;
            }
            let visible = self.table.get(child).is_none_or(Record::is_visible);
            self.layout.attach(child, Some(id), None, visible);
        }
    }

    /// Turn a waiting orphan into an expanded root.
    fn promote(&mut self, id: NodeId) {
        let Some(record) = self.table.get_mut(id) else {
            return;
        };
        tracing::warn!(id = %record.id, parent = ?record.parent_id, "orphan promoted to root");
        record.parent_id = None;
        let visible = record.is_visible();
        self.layout.set_expanded(id, true);
        self.layout.attach(id, None, None, visible);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutlineOptions;
    use alloc::vec;
    use serde_json::json;

    fn forest() -> Outline {
        Outline::new(OutlineOptions::default().forest(true))
    }

    fn label(outline: &Outline, id: NodeId) -> &str {
        &outline.table().get(id).unwrap().label
    }

    #[test]
    fn children_before_parents_are_adopted() {
        let mut outline = forest();
        let c1 = outline.push_record(Record::new(3, "c1").with_parent(1)).unwrap();
        let c2 = outline.push_record(Record::new(4, "c2").with_parent(1)).unwrap();
        assert_eq!(outline.pending_orphans(), 2);
        assert!(outline.roots().is_empty());
        assert_eq!(outline.len(), outline.layout_tree().len());

        let p = outline.push_record(Record::new(1, "p")).unwrap();
        assert_eq!(outline.pending_orphans(), 0);
        assert_eq!(outline.roots(), [p]);
        assert_eq!(outline.layout(p).unwrap().children(), [c1, c2]);
        assert_eq!(outline.finish(), 0);
    }

    #[test]
    fn stranded_orphans_become_roots() {
        let mut outline = forest();
        outline.push_record(Record::new(1, "root"));
        let lost = outline
            .push_record(Record::new(2, "lost").with_parent(99))
            .unwrap();
        let child = outline
            .push_record(Record::new(3, "child").with_parent(2))
            .unwrap();
        assert_eq!(outline.finish(), 1);
        assert_eq!(outline.roots().len(), 2);
        assert_eq!(outline.roots()[1], lost);
        assert!(outline.layout(lost).unwrap().is_expanded());
        assert_eq!(outline.layout(lost).unwrap().children(), [child]);
        assert_eq!(outline.get(2).unwrap().parent_id, None);
        assert_eq!(outline.visible().len(), 3);
    }

    #[test]
    fn first_duplicate_wins() {
        let mut outline = forest();
        outline.push_record(Record::new(1, "first"));
        assert!(outline.push_record(Record::new(1, "second")).is_none());
        let id = outline.resolve(1).unwrap();
        assert_eq!(label(&outline, id), "first");
        assert_eq!(outline.len(), 1);
    }

    #[test]
    fn records_after_end_are_ignored() {
        let mut outline = forest();
        outline.on_record(Record::new(1, "a"));
        outline.on_end();
        assert!(outline.is_finished());
        outline.on_record(Record::new(2, "b"));
        assert_eq!(outline.len(), 1);
    }

    #[test]
    fn mutual_parents_do_not_form_a_cycle() {
        let mut outline = forest();
        let a = outline.push_record(Record::new(1, "a").with_parent(2)).unwrap();
        let b = outline.push_record(Record::new(2, "b").with_parent(1)).unwrap();
        outline.finish();
        assert_eq!(outline.roots(), [a]);
        assert_eq!(outline.layout(a).unwrap().hidden_children().len(), 0);
        assert_eq!(outline.layout(a).unwrap().children(), [b]);
        assert_eq!(outline.get(1).unwrap().parent_id, None);
    }

    #[test]
    fn self_parent_is_a_root() {
        let mut outline = forest();
        let a = outline.push_record(Record::new(1, "a").with_parent(1)).unwrap();
        assert_eq!(outline.roots(), [a]);
    }

    #[test]
    fn invisible_records_land_apart() {
        let mut outline = forest();
        let p = outline.push_record(Record::new(1, "p")).unwrap();
        let hidden = outline
            .push_record(Record::new(2, "h").with_parent(1).with_visible(false))
            .unwrap();
        let shown = outline.push_record(Record::new(3, "s").with_parent(1)).unwrap();
        let node = outline.layout(p).unwrap();
        assert_eq!(node.children(), [shown]);
        assert_eq!(node.invisible_children(), [hidden]);
        assert_eq!(outline.visible(), vec![p, shown]);
    }

    #[test]
    fn malformed_values_are_dropped() {
        let mut outline = forest();
        assert!(outline.push_value(json!({ "label": "no id" })).is_err());
        assert!(outline.push_value(json!([1, 2])).is_err());
        let ok = outline
            .push_value(json!({ "id": 5, "label": "five", "color": "red" }))
            .unwrap();
        assert!(ok.is_some());
        assert_eq!(outline.len(), 1);
        assert_eq!(outline.layout_tree().len(), 1);
    }

    #[test]
    fn add_adopts_waiting_orphans() {
        let mut outline = forest();
        let orphan = outline
            .push_record(Record::new(7, "orphan").with_parent(6))
            .unwrap();
        let parent = outline.add(Record::new(6, "parent"), None, None).unwrap();
        assert_eq!(outline.layout(parent).unwrap().children(), [orphan]);
        assert_eq!(outline.pending_orphans(), 0);
    }

    #[test]
    fn streamed_records_join_an_active_search() {
        let mut outline = forest();
        let root = outline.push_record(Record::new(1, "root")).unwrap();
        assert!(outline.search(Some("cake")));
        let cake = outline
            .push_record(Record::new(3, "cake").with_parent(2))
            .unwrap();
        assert!(outline.visible().is_empty(), "orphans are not searchable");

        let shelf = outline
            .push_record(Record::new(2, "shelf").with_parent(1))
            .unwrap();
        assert_eq!(outline.visible(), [root, shelf, cake]);
        assert_eq!(outline.search_matches(), [cake]);

        outline.finish();
        outline.search(None);
        assert!(!outline.layout(shelf).unwrap().is_expanded());
        assert_eq!(outline.visible(), [root, shelf]);
    }

    #[test]
    fn single_root_ingest_keeps_extra_roots() {
        let mut outline = Outline::new(OutlineOptions::default());
        outline.push_record(Record::new(1, "a"));
        outline.push_record(Record::new(2, "b"));
        outline.finish();
        assert_eq!(outline.roots().len(), 2);
    }
}
