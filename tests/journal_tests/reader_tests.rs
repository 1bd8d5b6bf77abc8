//! Tests for the journal reader
//!
//! These tests verify:
//! - Records come back in file order
//! - Blank lines are skipped
//! - A torn final line is dropped, a corrupt middle line is an error
//! - The scan can be restarted

use std::fs;
use std::path::PathBuf;

use shelfdb::journal::{JournalReader, Record};
use shelfdb::StoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_journal(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.jsonl");
    fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

fn read_all(path: &PathBuf) -> Vec<Record> {
    JournalReader::open(path)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, path) = setup_journal("");

    assert!(read_all(&path).is_empty());
}

#[test]
fn test_read_records_in_file_order() {
    let (_temp, path) = setup_journal(concat!(
        "{\"_id\":\"b\",\"n\":1}\n",
        "{\"_id\":\"a\",\"n\":2}\n",
        "{\"_id\":\"b\",\"_deleted\":true}\n",
    ));

    let ids: Vec<String> = read_all(&path).iter().map(|r| r.id().to_string()).collect();

    assert_eq!(ids, vec!["b", "a", "b"]);
}

#[test]
fn test_blank_lines_are_skipped() {
    let (_temp, path) = setup_journal("\n{\"_id\":\"a\"}\n\n   \n{\"_id\":\"b\"}\n");

    assert_eq!(read_all(&path).len(), 2);
}

#[test]
fn test_crlf_line_endings() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\r\n{\"_id\":\"b\"}\r\n");

    assert_eq!(read_all(&path).len(), 2);
}

#[test]
fn test_missing_file_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = JournalReader::open(&temp_dir.path().join("absent.jsonl"));

    assert!(matches!(result, Err(StoreError::Storage(_))));
}

// =============================================================================
// Partial Write Tests
// =============================================================================

#[test]
fn test_torn_tail_is_dropped() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\n{\"_id\":\"b\",\"na");

    let mut reader = JournalReader::open(&path).unwrap();
    let records: Vec<Record> = reader.by_ref().map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 1);
    assert!(reader.torn_tail());
    assert_eq!(reader.line_no(), 2);
}

#[test]
fn test_complete_unterminated_last_line_is_kept() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\n{\"_id\":\"b\"}");

    let mut reader = JournalReader::open(&path).unwrap();
    let records: Vec<Record> = reader.by_ref().map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 2);
    assert!(!reader.torn_tail());
}

#[test]
fn test_corrupt_middle_line_is_inconsistent() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\ngarbage\n{\"_id\":\"b\"}\n");

    let mut reader = JournalReader::open(&path).unwrap();
    assert!(reader.next().unwrap().is_ok());

    match reader.next() {
        Some(Err(StoreError::InconsistentJournal(reason))) => assert!(reason.contains(":2:")),
        other => panic!("expected inconsistency, got {:?}", other),
    }
    // the scan ends after an error
    assert!(reader.next().is_none());
}

#[test]
fn test_corrupt_terminated_last_line_is_inconsistent() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\n{\"_id\":\n");

    let results: Vec<_> = JournalReader::open(&path).unwrap().collect();

    assert_eq!(results.len(), 2);
    assert!(matches!(results[1], Err(StoreError::InconsistentJournal(_))));
}

// =============================================================================
// Restart Tests
// =============================================================================

#[test]
fn test_rewind_restarts_scan() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\n{\"_id\":\"b\"}\n");

    let mut reader = JournalReader::open(&path).unwrap();
    let first: Vec<Record> = reader.by_ref().map(|r| r.unwrap()).collect();
    assert!(reader.next().is_none());

    reader.rewind().unwrap();
    let second: Vec<Record> = reader.by_ref().map(|r| r.unwrap()).collect();

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[test]
fn test_next_record_is_lazy() {
    let (_temp, path) = setup_journal("{\"_id\":\"a\"}\ngarbage\n");

    let mut reader = JournalReader::open(&path).unwrap();

    // the first record is available before the bad line is reached
    assert_eq!(reader.next_record().unwrap().unwrap().id(), "a");
    assert!(reader.next_record().is_err());
}
