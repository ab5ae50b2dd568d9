// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests over randomly shaped forests.

use proptest::prelude::*;
use understory_outline::{NodeId, Outline, OutlineOptions, Record, RecordId};

/// Parent index per node: `None` for roots, otherwise an earlier node.
fn forest_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(any::<u16>(), 1..40).prop_map(|seeds| {
        seeds
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let pick = usize::from(*s) % (i + 1);
                (pick < i).then_some(pick)
            })
            .collect()
    })
}

fn record_id(i: usize) -> i64 {
    i64::try_from(i).unwrap() + 1
}

/// Ingest the forest with arrival order rotated by `rotate`, so children often
/// arrive before their parents.
fn build(shape: &[Option<usize>], rotate: usize) -> Outline {
    let n = shape.len();
    let records = (0..n).map(|k| {
        let i = (k + rotate) % n;
        let record = Record::new(record_id(i), format!("node {i}"));
        match shape[i] {
            Some(p) => record.with_parent(record_id(p)),
            None => record,
        }
    });
    Outline::from_records(OutlineOptions::default().forest(true), records)
}

fn subtree_size(shape: &[Option<usize>], k: usize) -> usize {
    1 + (0..shape.len())
        .filter(|c| shape[*c] == Some(k))
        .map(|c| subtree_size(shape, c))
        .sum::<usize>()
}

fn expansion(outline: &Outline) -> Vec<(NodeId, bool)> {
    outline
        .layout_tree()
        .ids()
        .map(|id| (id, outline.layout(id).unwrap().is_expanded()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn ingest_keeps_tables_in_step(shape in forest_shape(), rotate in 0_usize..40) {
        let mut outline = build(&shape, rotate);
        prop_assert_eq!(outline.len(), shape.len());
        prop_assert_eq!(outline.layout_tree().len(), shape.len());
        prop_assert_eq!(outline.pending_orphans(), 0);
        let roots = shape.iter().filter(|p| p.is_none()).count();
        prop_assert_eq!(outline.roots().len(), roots);
        outline.expand_all();
        prop_assert_eq!(outline.visible().len(), shape.len());
    }

    #[test]
    fn remove_takes_exactly_the_subtree(
        shape in forest_shape(),
        rotate in 0_usize..40,
        pick in any::<prop::sample::Index>(),
    ) {
        let mut outline = build(&shape, rotate);
        let k = pick.index(shape.len());
        let expected = shape.len() - subtree_size(&shape, k);
        prop_assert!(outline.remove_node(record_id(k)));
        prop_assert_eq!(outline.len(), expected);
        prop_assert_eq!(outline.layout_tree().len(), expected);
        prop_assert!(outline.get(record_id(k)).is_none());
    }

    #[test]
    fn add_then_remove_restores_sizes(
        shape in forest_shape(),
        pick in any::<prop::sample::Index>(),
        index in 0_usize..8,
    ) {
        let mut outline = build(&shape, 0);
        let before = outline.visible();
        let parent = RecordId::Int(record_id(pick.index(shape.len())));
        let added = outline.add(Record::new(-1, "added"), Some(&parent), Some(index));
        prop_assert!(added.is_some());
        prop_assert_eq!(outline.len(), shape.len() + 1);
        prop_assert!(outline.remove_node(-1));
        prop_assert_eq!(outline.len(), shape.len());
        prop_assert_eq!(outline.layout_tree().len(), shape.len());
        prop_assert_eq!(outline.visible(), before);
    }

    #[test]
    fn toggle_twice_is_identity(
        shape in forest_shape(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut outline = build(&shape, 0);
        let k = record_id(pick.index(shape.len()));
        let visible = outline.visible();
        let node = outline.layout(k).unwrap();
        let partition = (node.children().to_vec(), node.hidden_children().to_vec());

        let flipped = outline.toggle(k);
        prop_assert_eq!(outline.toggle(k), flipped);
        let node = outline.layout(k).unwrap();
        prop_assert_eq!((node.children().to_vec(), node.hidden_children().to_vec()), partition);
        prop_assert_eq!(outline.visible(), visible);
    }

    #[test]
    fn search_is_idempotent_and_restores(
        shape in forest_shape(),
        collapsed in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        digit in 0_u8..10,
    ) {
        let mut outline = build(&shape, 0);
        outline.expand_all();
        for c in &collapsed {
            outline.toggle(record_id(c.index(shape.len())));
        }
        let visible = outline.visible();
        let expanded = expansion(&outline);

        let query = format!("{digit}");
        prop_assert!(outline.search(Some(query.as_str())));
        let once = outline.visible();
        outline.search(Some(query.as_str()));
        prop_assert_eq!(outline.visible(), once.clone());
        for id in &once {
            let node = outline.layout(*id).unwrap();
            let label = &outline.get(*id).unwrap().label;
            prop_assert!(node.matches_search() || node.is_expanded());
            prop_assert_eq!(node.matches_search(), label.contains(query.as_str()));
        }

        prop_assert!(outline.search(None));
        prop_assert_eq!(outline.visible(), visible);
        prop_assert_eq!(expansion(&outline), expanded);
    }
}
