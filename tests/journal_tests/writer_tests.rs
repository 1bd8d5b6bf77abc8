//! Tests for the journal writer
//!
//! These tests verify:
//! - Each append is visible on disk as soon as it returns
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Appends go after existing contents

use std::fs;
use std::path::PathBuf;

use shelfdb::config::JournalSync;
use shelfdb::journal::{Fields, JournalReader, JournalWriter, Record, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_journal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.jsonl");
    (temp_dir, path)
}

fn named(id: &str, name: &str) -> Record {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), Value::from(name));
    Record::upsert(id, fields)
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, path) = setup_temp_journal();

    let _writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();

    assert!(path.exists());
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_append_is_visible_before_close() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryNEntries { count: 100 }).unwrap();

    writer.append(&named("A001", "Alice")).unwrap();

    // flushed to the OS even though no fsync happened yet
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.ends_with('\n'));
    assert_eq!(writer.appended_count(), 1);
}

#[test]
fn test_appended_records_read_back_in_order() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();

    let written = vec![
        named("A001", "Alice"),
        named("A001", "Alicia"),
        Record::tombstone("A001"),
    ];
    for record in &written {
        writer.append(record).unwrap();
    }
    writer.close().unwrap();

    let read: Vec<Record> = JournalReader::open(&path).unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(read, written);
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let (_temp, path) = setup_temp_journal();

    let mut writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();
    writer.append(&named("a", "1")).unwrap();
    writer.close().unwrap();

    let mut writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();
    writer.append(&named("b", "2")).unwrap();
    writer.close().unwrap();

    let ids: Vec<String> = JournalReader::open(&path)
        .unwrap()
        .map(|r| r.unwrap().id().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();

    writer.append(&named("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&named("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryNEntries { count: 3 }).unwrap();

    writer.append(&named("k1", "v")).unwrap();
    writer.append(&named("k2", "v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.append(&named("k3", "v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&named("k4", "v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
}

#[test]
fn test_manual_sync() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryNEntries { count: 100 }).unwrap();

    for i in 0..10 {
        writer.append(&named(&format!("k{}", i), "v")).unwrap();
    }
    assert_eq!(writer.uncommitted_count(), 10);

    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

// =============================================================================
// Failed Appends
// =============================================================================

#[test]
fn test_abandon_after_successful_appends_keeps_them() {
    let (_temp, path) = setup_temp_journal();
    let mut writer = JournalWriter::open(&path, JournalSync::EveryWrite).unwrap();
    writer.append(&named("k1", "v")).unwrap();
    assert_eq!(writer.pending_bytes(), 0);

    writer.abandon();

    let ids: Vec<String> = JournalReader::open(&path)
        .unwrap()
        .map(|r| r.unwrap().id().to_string())
        .collect();
    assert_eq!(ids, vec!["k1"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_append_leaves_bytes_that_abandon_drops() {
    let device = std::path::Path::new("/dev/full");
    if !device.exists() {
        return;
    }
    let mut writer = JournalWriter::open(device, JournalSync::EveryWrite).unwrap();

    let result = writer.append(&named("k1", "v"));

    assert!(matches!(result, Err(shelfdb::StoreError::Storage(_))));
    assert_eq!(writer.appended_count(), 0);
    // close would try to flush the rejected record again
    assert!(writer.pending_bytes() > 0);
    writer.abandon();
}
