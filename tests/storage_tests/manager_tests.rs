//! Tests for StorageManager
//!
//! These tests verify:
//! - Empty snapshots create no segment
//! - Newer segments shadow older ones in both directions
//! - Segment discovery and id assignment on reopen
//! - Leftover temp files are cleaned up
//! - Malformed segments are skipped during lookup

use std::fs;

use segkv::memtable::MemTable;
use segkv::storage::{LookupResult, StorageManager};
use tempfile::TempDir;

fn setup_temp_storage() -> (TempDir, StorageManager) {
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open(temp_dir.path()).unwrap();
    (temp_dir, manager)
}

fn flush_sets(manager: &StorageManager, pairs: &[(&str, &str)]) {
    let memtable = MemTable::new();
    for (k, v) in pairs {
        memtable.set(k.as_bytes().to_vec(), v.as_bytes().to_vec());
    }
    manager.flush(&memtable.snapshot()).unwrap();
}

fn flush_deletes(manager: &StorageManager, keys: &[&str]) {
    let memtable = MemTable::new();
    for k in keys {
        memtable.delete(k.as_bytes().to_vec());
    }
    manager.flush(&memtable.snapshot()).unwrap();
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_empty_flush_creates_no_file() {
    let (temp_dir, manager) = setup_temp_storage();

    let result = manager.flush(&MemTable::new().snapshot()).unwrap();

    assert!(result.is_none());
    assert_eq!(manager.segment_count(), 0);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_flush_assigns_increasing_ids() {
    let (_temp_dir, manager) = setup_temp_storage();
    assert_eq!(manager.next_segment_id(), 1);

    flush_sets(&manager, &[("a", "1")]);
    flush_sets(&manager, &[("b", "2")]);

    assert_eq!(manager.segment_count(), 2);
    assert_eq!(manager.next_segment_id(), 3);

    let paths = manager.segment_paths();
    assert!(paths[0].ends_with("segment_00000000000000000002.seg"));
    assert!(paths[1].ends_with("segment_00000000000000000001.seg"));
}

#[test]
fn test_flush_meta_counts_both_kinds() {
    let (_temp_dir, manager) = setup_temp_storage();
    let memtable = MemTable::new();
    memtable.set(b"a".to_vec(), b"1".to_vec());
    memtable.set(b"bb".to_vec(), b"2".to_vec());
    memtable.delete(b"ccc".to_vec());

    let meta = manager.flush(&memtable.snapshot()).unwrap().unwrap();

    assert_eq!(meta.entry_count(), 3);
    assert_eq!(meta.smallest_key, b"a".to_vec());
    assert_eq!(meta.largest_key, b"ccc".to_vec());
    assert!(meta.might_contain(b"zz"));
    assert!(!meta.might_contain(b"zzzz"));
}

// =============================================================================
// Lookup Precedence Tests
// =============================================================================

#[test]
fn test_lookup_missing_without_segments() {
    let (_temp_dir, manager) = setup_temp_storage();
    assert_eq!(manager.lookup(b"anything"), LookupResult::NotFound);
}

#[test]
fn test_newer_delete_shadows_older_set() {
    let (_temp_dir, manager) = setup_temp_storage();

    flush_sets(&manager, &[("k", "v")]);
    flush_deletes(&manager, &["k"]);

    assert_eq!(manager.lookup(b"k"), LookupResult::Deleted);
}

#[test]
fn test_newer_set_shadows_older_delete() {
    let (_temp_dir, manager) = setup_temp_storage();

    flush_deletes(&manager, &["k"]);
    flush_sets(&manager, &[("k", "v2")]);

    assert_eq!(manager.lookup(b"k"), LookupResult::Found(b"v2".to_vec()));
}

#[test]
fn test_lookup_falls_through_to_older_segments() {
    let (_temp_dir, manager) = setup_temp_storage();

    flush_sets(&manager, &[("old", "1")]);
    flush_sets(&manager, &[("new", "2")]);

    assert_eq!(manager.lookup(b"old"), LookupResult::Found(b"1".to_vec()));
    assert_eq!(manager.lookup(b"new"), LookupResult::Found(b"2".to_vec()));
    assert_eq!(manager.lookup(b"none"), LookupResult::NotFound);
}

#[test]
fn test_malformed_segment_is_skipped() {
    let (_temp_dir, manager) = setup_temp_storage();

    flush_sets(&manager, &[("k", "old")]);
    flush_sets(&manager, &[("k", "new")]);

    // Wreck the newest segment's magic
    let newest = manager.segment_paths()[0].clone();
    let mut data = fs::read(&newest).unwrap();
    data[0] ^= 0xFF;
    fs::write(&newest, data).unwrap();

    assert_eq!(manager.lookup(b"k"), LookupResult::Found(b"old".to_vec()));
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_discovers_segments() {
    let temp_dir = TempDir::new().unwrap();

    {
        let manager = StorageManager::open(temp_dir.path()).unwrap();
        flush_sets(&manager, &[("a", "1")]);
        flush_deletes(&manager, &["a"]);
    }

    let manager = StorageManager::open(temp_dir.path()).unwrap();
    assert_eq!(manager.segment_count(), 2);
    assert_eq!(manager.next_segment_id(), 3);
    assert_eq!(manager.lookup(b"a"), LookupResult::Deleted);
}

#[test]
fn test_open_removes_tmp_files() {
    let temp_dir = TempDir::new().unwrap();
    let tmp = temp_dir.path().join("segment_00000000000000000005.seg.tmp");
    fs::write(&tmp, b"half written").unwrap();

    let manager = StorageManager::open(temp_dir.path()).unwrap();

    assert!(!tmp.exists());
    assert_eq!(manager.segment_count(), 0);
    assert_eq!(manager.next_segment_id(), 1);
}

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a").join("segments");

    let manager = StorageManager::open(&nested).unwrap();

    assert!(nested.is_dir());
    assert_eq!(manager.dir(), nested.as_path());
}
