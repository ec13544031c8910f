//! Walking a document's history with the codec alone (no store).
//!
//! Mirrors what the resolver does: start from the newest snapshot and undo
//! deltas newest-first.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use chron_core::delta::{diff, patch, unpatch};
use chron_core::filter::FieldFilter;

fn snapshots() -> Vec<Value> {
    vec![
        json!({"title": "Printer on fire", "status": "open", "tags": []}),
        json!({"title": "Printer on fire", "status": "open", "tags": [{"id": "hw"}]}),
        json!({
            "title": "Printer on fire",
            "status": "in_progress",
            "tags": [{"id": "hw"}, {"id": "p1"}],
            "assignee": {"name": "ann"}
        }),
        json!({
            "title": "Printer was on fire",
            "status": "closed",
            "tags": [{"id": "p1"}, {"id": "hw", "note": "replaced"}],
            "assignee": null
        }),
    ]
}

fn deltas(snaps: &[Value]) -> Vec<Value> {
    snaps
        .windows(2)
        .map(|pair| diff(&pair[0], &pair[1]).expect("consecutive snapshots differ"))
        .collect()
}

#[test]
fn every_version_is_reachable_from_the_latest() {
    let snaps = snapshots();
    let deltas = deltas(&snaps);

    for target in 0..snaps.len() {
        let mut doc = snaps.last().unwrap().clone();
        for delta in deltas[target..].iter().rev() {
            doc = unpatch(&doc, delta).unwrap();
        }
        assert_eq!(doc, snaps[target], "reconstructing version {target}");
    }
}

#[test]
fn forward_replay_rebuilds_the_latest() {
    let snaps = snapshots();
    let mut doc = snaps[0].clone();
    for delta in deltas(&snaps) {
        doc = patch(&doc, &delta).unwrap();
    }
    assert_eq!(&doc, snaps.last().unwrap());
}

#[test]
fn creation_and_removal_bracket_the_history() {
    let doc = json!({"name": "widget", "parts": [{"_id": 1}, {"_id": 2}]});
    let created = diff(&json!({}), &doc).unwrap();
    let removed = diff(&doc, &json!({})).unwrap();

    let after_removal = json!({});
    let before_removal = unpatch(&after_removal, &removed).unwrap();
    assert_eq!(before_removal, doc);
    assert_eq!(unpatch(&before_removal, &created).unwrap(), json!({}));
}

#[test]
fn no_op_mutation_produces_nothing_to_record() {
    let doc = json!({"a": {"b": [1, 2, {"id": 3}]}});
    let delta = diff(&doc, &doc);
    assert_eq!(delta.and_then(|d| FieldFilter::none().apply(d)), None);
}
