//! Tests for the journal record codec
//!
//! These tests verify:
//! - Upsert and tombstone line shapes
//! - Reserved keys (`_id`, `_deleted`, `_rekeyed_from`)
//! - Rejection of values outside the field grammar

use std::collections::BTreeMap;

use shelfdb::journal::{Fields, Record, Value};
use shelfdb::StoreError;

// =============================================================================
// Helper Functions
// =============================================================================

fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn assert_inconsistent(line: &str) {
    match Record::decode(line) {
        Err(StoreError::InconsistentJournal(_)) => {}
        other => panic!("expected InconsistentJournal for {}, got {:?}", line, other),
    }
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_tombstone_carries_only_id_and_marker() {
    let line = Record::tombstone("A001").encode().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

    assert_eq!(parsed, serde_json::json!({"_id": "A001", "_deleted": true}));
}

#[test]
fn test_encode_upsert_adds_id_key() {
    let record = Record::upsert("A001", fields(&[("name", "Alice".into())]));
    let line = record.encode().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

    assert_eq!(parsed, serde_json::json!({"_id": "A001", "name": "Alice"}));
    assert!(!line.contains('\n'));
}

#[test]
fn test_encode_rekey_upsert_names_retired_id() {
    let record = Record::Upsert {
        id: "new".to_string(),
        fields: Fields::new(),
        rekeyed_from: Some("old".to_string()),
    };
    let parsed: serde_json::Value = serde_json::from_str(&record.encode().unwrap()).unwrap();

    assert_eq!(parsed, serde_json::json!({"_id": "new", "_rekeyed_from": "old"}));
}

#[test]
fn test_encode_rejects_reserved_field_names() {
    let record = Record::upsert("A001", fields(&[("_deleted", true.into())]));

    assert!(matches!(record.encode(), Err(StoreError::Validation(_))));
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_decode_all_value_kinds() {
    let line = r#"{"_id":"b1","name":"Dune","stock":3,"used":false,"keywords":["sf","classic"],"meta":{"shelf":"A","row":2}}"#;
    let record = Record::decode(line).unwrap();

    let mut meta = BTreeMap::new();
    meta.insert("shelf".to_string(), Value::from("A"));
    meta.insert("row".to_string(), Value::Int(2));
    let expected = fields(&[
        ("name", "Dune".into()),
        ("stock", Value::Int(3)),
        ("used", Value::Bool(false)),
        ("keywords", vec!["sf", "classic"].into()),
        ("meta", Value::Map(meta)),
    ]);

    assert_eq!(record, Record::upsert("b1", expected));
}

#[test]
fn test_decode_tombstone() {
    let record = Record::decode(r#"{"_id":"A001","_deleted":true}"#).unwrap();

    assert_eq!(record, Record::tombstone("A001"));
    assert!(record.is_tombstone());
    assert_eq!(record.id(), "A001");
}

#[test]
fn test_decode_round_trips_encoded_upsert() {
    let record = Record::upsert(
        "978-7",
        fields(&[("keywords", vec!["a", "b"].into()), ("stock", Value::Int(-1))]),
    );

    assert_eq!(Record::decode(&record.encode().unwrap()).unwrap(), record);
}

#[test]
fn test_decode_rejects_missing_or_empty_id() {
    assert_inconsistent(r#"{"name":"Alice"}"#);
    assert_inconsistent(r#"{"_id":"","name":"Alice"}"#);
    assert_inconsistent(r#"{"_id":7,"name":"Alice"}"#);
}

#[test]
fn test_decode_rejects_tombstone_with_fields() {
    assert_inconsistent(r#"{"_id":"A001","_deleted":true,"name":"Alice"}"#);
}

#[test]
fn test_decode_rejects_non_true_deleted_marker() {
    assert_inconsistent(r#"{"_id":"A001","_deleted":false}"#);
    assert_inconsistent(r#"{"_id":"A001","_deleted":"yes"}"#);
}

#[test]
fn test_decode_rejects_unsupported_values() {
    assert_inconsistent(r#"{"_id":"A001","price":1.5}"#);
    assert_inconsistent(r#"{"_id":"A001","note":null}"#);
    assert_inconsistent(r#"{"_id":"A001","tags":["a",1]}"#);
}

#[test]
fn test_decode_rejects_unknown_reserved_key() {
    assert_inconsistent(r#"{"_id":"A001","_oldId":"A000"}"#);
}

#[test]
fn test_decode_rejects_non_objects() {
    assert_inconsistent("[1,2,3]");
    assert_inconsistent("not json");
    assert_inconsistent(r#"{"_id":"A001""#);
}
