//! Generated round trips for the delta codec over mixed nested documents.
//!
//! Keys, ids and scalars are drawn from small pools so that independently
//! generated snapshots still share structure, which drives the array matcher
//! through trimming, LCS, moves and nested element deltas.

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use chron_core::delta::{diff, patch, unpatch};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-2i64..3).prop_map(Value::from),
        prop::sample::select(vec!["a", "b", ""]).prop_map(Value::from),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            object_of(inner.clone()),
            // Identified elements, so arrays of them produce moves.
            (prop::sample::select(vec!["_id", "id"]), 0u8..4, inner).prop_map(|(key, id, v)| {
                let mut item = Map::new();
                item.insert(key.to_string(), Value::from(id));
                item.insert("v".to_string(), v);
                Value::Object(item)
            }),
        ]
    })
}

fn object_of(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    prop::collection::btree_map(prop::sample::select(vec!["x", "y", "z", "w"]), inner, 0..4)
        .prop_map(|fields| {
            Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect::<Map<String, Value>>(),
            )
        })
}

fn document() -> impl Strategy<Value = Value> {
    object_of(value())
}

/// A list of identified items and a reordering of it with some items edited.
fn reordered_list() -> impl Strategy<Value = (Value, Value)> {
    prop::collection::vec((0u8..6, scalar()), 0..8)
        .prop_flat_map(|items| {
            let before: Vec<Value> = items
                .iter()
                .map(|(id, v)| json!({"_id": id, "v": v}))
                .collect();
            let after = Just(before.clone())
                .prop_shuffle()
                .prop_flat_map(|shuffled| {
                    let len = shuffled.len();
                    (Just(shuffled), prop::collection::vec(any::<bool>(), len))
                })
                .prop_map(|(mut shuffled, edits)| {
                    for (item, edit) in shuffled.iter_mut().zip(edits) {
                        if edit {
                            item["v"] = json!("edited");
                        }
                    }
                    shuffled
                });
            (Just(before), after)
        })
        .prop_map(|(before, after)| (json!({"list": before}), json!({"list": after})))
}

fn assert_round_trip(before: &Value, after: &Value) -> Result<(), TestCaseError> {
    match diff(before, after) {
        None => {
            prop_assert_eq!(before, after);
        }
        Some(delta) => {
            prop_assert_ne!(before, after);
            prop_assert_eq!(&patch(before, &delta).unwrap(), after, "delta {}", delta);
            prop_assert_eq!(&unpatch(after, &delta).unwrap(), before, "delta {}", delta);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn independent_documents_round_trip(before in document(), after in document()) {
        assert_round_trip(&before, &after)?;
    }

    #[test]
    fn reordered_identified_lists_round_trip((before, after) in reordered_list()) {
        assert_round_trip(&before, &after)?;
    }

    #[test]
    fn document_has_no_delta_against_itself(doc in document()) {
        prop_assert_eq!(diff(&doc, &doc), None);
    }
}
