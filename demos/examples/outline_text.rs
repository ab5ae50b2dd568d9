// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text rendering of an outline driven through its public API.
//!
//! This example shows how to:
//! - stream records (children before parents) into an `Outline`,
//! - hand each batch to a `Renderer` and draw the visible rows as text,
//! - search, select, and drag a node with `RowDropResolver`.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example outline_text`

use kurbo::{Point, Vec2};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use understory_outline::{
    Frame, Outline, OutlineEvent, OutlineOptions, Record, RecordPatch, Renderer, RowDropResolver,
    SelectOptions,
};

const ROW_HEIGHT: f64 = 24.0;
const INDENT: f64 = 16.0;

/// Keeps the last frame; drawing needs the outline to look up labels.
#[derive(Default)]
struct TextRenderer {
    frames: usize,
    last: Frame,
}

impl Renderer for TextRenderer {
    fn render(&mut self, frame: &Frame) {
        self.frames += 1;
        self.last = frame.clone();
    }

    fn notify(&mut self, event: &OutlineEvent) {
        match event {
            OutlineEvent::Select { id, .. } => println!("  (select {id})"),
            OutlineEvent::Move(m) => println!(
                "  (move {} from {:?}[{}] to {:?}[{}])",
                m.id, m.previous_parent, m.previous_index, m.new_parent, m.new_index
            ),
        }
    }
}

fn draw(title: &str, outline: &Outline, renderer: &TextRenderer) {
    let frame = &renderer.last;
    println!(
        "\n== {title} == ({} rows, +{} -{} ~{}{})",
        frame.visible.len(),
        frame.entered.len(),
        frame.exited.len(),
        frame.moved.len(),
        if frame.animate { "" } else { ", no animation" }
    );
    for id in &frame.visible {
        let (Some(record), Some(node)) = (outline.get(*id), outline.layout(*id)) else {
            continue;
        };
        let depth = outline.layout_tree().depth(*id);
        let marker = if !node.has_children() {
            ' '
        } else if node.is_expanded() {
            '-'
        } else {
            '+'
        };
        let selected = if node.is_selected() { " <" } else { "" };
        let matched = if node.matches_search() { " *" } else { "" };
        println!(
            "{:indent$}{marker} {}{matched}{selected}",
            "",
            record.label,
            indent = depth * 2
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut outline = Outline::new(OutlineOptions::default().forest(true).editable(true));
    let mut renderer = TextRenderer::default();

    // Children first, parents later, one stray record with a missing parent.
    let records = [
        Record::new(1003, "Grumpy's life").with_parent(1002),
        Record::new(1001, "Folder A"),
        Record::new(1004, "The cat's second birthday").with_parent(1002),
        Record::new(1002, "Grumpy Cats").with_attribute("color", "orange"),
        Record::new(1005, "Cake").with_parent(1004),
        Record::new(1099, "Lost and found").with_parent(4242),
    ];
    let inserted = outline.ingest(records, &mut renderer);
    println!("ingested {inserted} records in {} frames", renderer.frames);
    draw("after ingest", &outline, &renderer);

    // Malformed input is reported and skipped.
    if let Err(err) = outline.push_value(json!({ "label": "no id" })) {
        println!("\nskipped record: {err}");
    }

    outline.search(Some("cake"));
    outline.flush(&mut renderer);
    draw("search \"cake\"", &outline, &renderer);

    outline.search(None);
    outline.select(1001, SelectOptions::default());
    outline.flush(&mut renderer);
    draw("search cleared, Folder A selected", &outline, &renderer);

    outline.patch_stream(
        [
            RecordPatch::new(1003).label("Grumpy's whole life"),
            RecordPatch::new(1099).visible(false),
        ],
        &mut renderer,
    );
    draw("patched", &outline, &renderer);

    // "Cake" sits under a collapsed node; reveal it so it has a row to drag.
    outline.select(1005, SelectOptions::default().silent());
    outline.flush(&mut renderer);
    draw("Cake revealed", &outline, &renderer);

    // Drag "Cake" to the top of the list.
    let rows = RowDropResolver::new(ROW_HEIGHT, INDENT);
    if outline.drag_start(1005, Vec2::new(4.0, ROW_HEIGHT / 2.0)) {
        outline.drag_to(Point::new(0.0, 2.0), &rows);
        outline.drag_end();
    }
    outline.flush(&mut renderer);
    draw("dragged Cake to the top", &outline, &renderer);
}
