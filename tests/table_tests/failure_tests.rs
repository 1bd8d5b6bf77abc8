//! Tests for fail-fast behavior
//!
//! These tests verify:
//! - Closed tables refuse every operation
//! - A storage error during a mutation fails the table for good
//! - An inconsistent journal refuses to open

use std::fs;

use shelfdb::journal::{Fields, Value};
use shelfdb::{Config, KeyOrder, Limit, Predicate, StoreError, Table};
use tempfile::TempDir;

fn setup_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path().join("data")).build();
    (temp_dir, config)
}

fn stock(n: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("stock".to_string(), Value::Int(n));
    fields
}

#[test]
fn test_closed_table_refuses_operations() {
    let (_temp, config) = setup_config();
    let mut table = Table::open(&config, "books", KeyOrder::Lexical).unwrap();
    table.put("a", stock(1)).unwrap();

    table.close().unwrap();
    table.close().unwrap();

    assert!(table.is_closed());
    assert!(matches!(table.get("a"), Err(StoreError::TableFailed { .. })));
    assert!(matches!(table.put("b", stock(1)), Err(StoreError::TableFailed { .. })));
    assert!(matches!(table.delete("a"), Err(StoreError::TableFailed { .. })));
    assert!(matches!(
        table.find_many(&Predicate::new(), Limit::Unbounded),
        Err(StoreError::TableFailed { .. })
    ));
}

#[test]
fn test_storage_error_fails_table() {
    let (_temp, config) = setup_config();
    let mut table = Table::open(&config, "books", KeyOrder::Lexical).unwrap();
    table.put("a", stock(1)).unwrap();

    // the rewrite has nowhere to put its scratch file
    fs::remove_dir_all(&config.data_dir).unwrap();
    let result = table.compact();

    assert!(matches!(result, Err(StoreError::Storage(_))));
    assert!(table.failure().is_some());
    assert!(matches!(table.get("a"), Err(StoreError::TableFailed { .. })));
    assert!(matches!(table.put("b", stock(2)), Err(StoreError::TableFailed { .. })));
}

#[test]
fn test_failed_table_drops_its_appender() {
    let (_temp, config) = setup_config();
    let mut table = Table::open(&config, "books", KeyOrder::Lexical).unwrap();
    table.put("a", stock(1)).unwrap();

    fs::remove_dir_all(&config.data_dir).unwrap();
    assert!(table.compact().is_err());

    // nothing is flushed on the way out
    assert!(table.is_closed());
    table.close().unwrap();
    assert!(table.failure().is_some());
}

#[test]
fn test_inconsistent_journal_refuses_open() {
    let (_temp, config) = setup_config();
    fs::create_dir_all(&config.data_dir).unwrap();
    let path = config.journal_path("books");
    fs::write(
        &path,
        "{\"_id\":\"a\",\"stock\":1}\n{\"_id\":\"b\",\"_deleted\":true}\n",
    )
    .unwrap();

    let result = Table::open(&config, "books", KeyOrder::Lexical);

    match result {
        Err(StoreError::InconsistentJournal(reason)) => assert!(reason.contains(":2:")),
        other => panic!("expected inconsistent journal, got {:?}", other.map(|t| t.len())),
    }
    // the journal is left as found
    assert!(fs::read_to_string(&path).unwrap().contains("_deleted"));
}

#[test]
fn test_corrupt_middle_line_refuses_open() {
    let (_temp, config) = setup_config();
    fs::create_dir_all(&config.data_dir).unwrap();
    fs::write(
        config.journal_path("books"),
        "{\"_id\":\"a\"}\nnot json\n{\"_id\":\"b\"}\n",
    )
    .unwrap();

    let result = Table::open(&config, "books", KeyOrder::Lexical);

    assert!(matches!(result, Err(StoreError::InconsistentJournal(_))));
}
