//! Integration tests for serialization of the collection family.
//!
//! The wire form is a sequence of `(key, share, column)` triples, where
//! `share` points at the first position holding the same instance. These
//! tests pin that format and the identity guarantees it carries.

#![cfg(feature = "serde")]

use colonnade::collection::{CollectionWithView, ColumnCollection, UniqueColumnCollection};
use colonnade::column::{ColumnRef, Keyed, SimpleColumn, column};
use rstest::rstest;
use serde_json::json;

#[rstest]
fn test_lenient_round_trip_restores_keys_and_values() {
    let collection = ColumnCollection::new();
    collection.add(column("c1"));
    collection.add(column("c2"));
    collection.add(column("c3"));
    collection.add(column("c2"));

    let json = serde_json::to_string(&collection).unwrap();
    let restored: ColumnCollection<SimpleColumn> = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.keys(), ["c1", "c2", "c3", "c2"]);
    for (original, copy) in collection.columns().into_iter().zip(restored.columns()) {
        assert_eq!(original.key(), copy.key());
        assert_eq!(original.name(), copy.name());
    }
}

#[rstest]
fn test_round_trip_mints_fresh_instances() {
    let c1 = column("c1");
    let collection = ColumnCollection::new();
    collection.add(c1.clone());

    let json = serde_json::to_string(&collection).unwrap();
    let restored: ColumnCollection<SimpleColumn> = serde_json::from_str(&json).unwrap();
    let copy = restored.get("c1").unwrap();

    assert_eq!(copy.key(), "c1");
    assert!(!ColumnRef::ptr_eq(&c1, &copy));
    assert!(!restored.contains_column(&c1));
}

#[rstest]
fn test_shared_instances_stay_shared_after_the_round_trip() {
    let a = column("a");
    let collection = ColumnCollection::from_entries([("a", a.clone()), ("a", a)]);

    let json = serde_json::to_string(&collection).unwrap();
    let restored: ColumnCollection<SimpleColumn> = serde_json::from_str(&json).unwrap();
    let columns = restored.columns();

    assert_eq!(columns.len(), 2);
    assert!(ColumnRef::ptr_eq(&columns[0], &columns[1]));
}

#[rstest]
fn test_distinct_duplicates_stay_distinct_after_the_round_trip() {
    let collection = ColumnCollection::new();
    collection.add(column("c2"));
    collection.add(column("c2"));

    let json = serde_json::to_string(&collection).unwrap();
    let restored: ColumnCollection<SimpleColumn> = serde_json::from_str(&json).unwrap();
    let columns = restored.columns();

    assert!(!ColumnRef::ptr_eq(&columns[0], &columns[1]));
}

#[rstest]
fn test_wire_format_is_a_sequence_of_key_share_column_triples() {
    let a = column("a");
    let collection = ColumnCollection::from_entries([("a", a.clone()), ("a", a)]);

    let value = serde_json::to_value(&collection).unwrap();

    // the second triple's share points back at position 0
    assert_eq!(
        value,
        json!([
            ["a", 0, { "key": "a", "name": "a" }],
            ["a", 0, { "key": "a", "name": "a" }],
        ])
    );
}

#[rstest]
fn test_strict_round_trip_restores_the_deduped_sequence() {
    let collection = UniqueColumnCollection::new();
    collection.add(column("c1"));
    collection.add(column("c2"));
    collection.add(column("c3"));
    collection.add(column("c2"));

    let json = serde_json::to_string(&collection).unwrap();
    let restored: UniqueColumnCollection<SimpleColumn> = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.keys(), ["c1", "c2", "c3"]);
    assert_eq!(restored.get("c2").unwrap().name(), "c2");
}

#[rstest]
fn test_strict_rejects_a_stream_with_mismatched_keys() {
    let stream = json!([["sum", 0, { "key": "total", "name": "total" }]]);

    let result = serde_json::from_value::<UniqueColumnCollection<SimpleColumn>>(stream);

    let message = result.unwrap_err().to_string();
    assert!(message.contains("deduplicating collection"), "{message}");
}

#[rstest]
fn test_forward_share_references_are_rejected() {
    let stream = json!([["a", 1, { "key": "a", "name": "a" }]]);

    let result = serde_json::from_value::<ColumnCollection<SimpleColumn>>(stream);

    let message = result.unwrap_err().to_string();
    assert!(message.contains("share index 1"), "{message}");
}

#[rstest]
fn test_views_serialize_exactly_like_their_source() {
    let collection = UniqueColumnCollection::new();
    collection.add(column("c1"));
    collection.add(column("c2"));
    let view = collection.as_immutable();

    assert_eq!(
        serde_json::to_value(&view).unwrap(),
        serde_json::to_value(&collection).unwrap()
    );
}

// =============================================================================
// Collection-with-view pairs
// =============================================================================

#[rstest]
fn test_pair_round_trip_reestablishes_the_view() {
    let collection = UniqueColumnCollection::new();
    collection.add(column("c1"));
    collection.add(column("c2"));
    let pair = CollectionWithView::new(collection);

    let json = serde_json::to_string(&pair).unwrap();
    let restored: CollectionWithView<UniqueColumnCollection<SimpleColumn>> =
        serde_json::from_str(&json).unwrap();

    assert_eq!(restored.view().keys(), ["c1", "c2"]);
    assert!(restored.view().is_view_of(restored.collection()));

    // the reattached view keeps tracking mutations
    let c3 = column("c3");
    restored.collection().add(c3.clone());
    assert_eq!(restored.view().get("c3"), Some(c3));
}

#[rstest]
fn test_pair_round_trip_keeps_lenient_duplicates() {
    let a = column("a");
    let collection = ColumnCollection::from_entries([("a", a.clone()), ("a", a)]);
    collection.add(column("b"));
    let pair = CollectionWithView::new(collection);

    let json = serde_json::to_string(&pair).unwrap();
    let restored: CollectionWithView<ColumnCollection<SimpleColumn>> =
        serde_json::from_str(&json).unwrap();

    let columns = restored.view().columns();
    assert_eq!(restored.view().keys(), ["a", "a", "b"]);
    assert!(ColumnRef::ptr_eq(&columns[0], &columns[1]));
    assert!(restored.view().is_view_of(restored.collection()));
}

#[rstest]
fn test_pair_wire_format_is_the_collection_alone() {
    let collection = UniqueColumnCollection::new();
    collection.add(column("c1"));
    let pair = CollectionWithView::new(collection);

    assert_eq!(
        serde_json::to_value(&pair).unwrap(),
        serde_json::to_value(pair.collection()).unwrap()
    );
}
