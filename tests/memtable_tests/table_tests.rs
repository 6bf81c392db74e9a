//! MemTable Tests
//!
//! Tests verify:
//! - Basic set/get/delete operations
//! - Live/tombstone exclusivity
//! - Size reporting and threshold checks
//! - Snapshots in key order
//! - Clear functionality
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use segkv::memtable::MemTable;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.size(), (0, 0));
    assert!(memtable.is_empty());
}

#[test]
fn test_default_matches_new() {
    let memtable = MemTable::default();
    assert!(memtable.is_empty());

    memtable.set(b"k".to_vec(), b"v".to_vec());
    assert_eq!(memtable.get(b"k"), Some(b"v".to_vec()));
}

#[test]
fn test_set_and_get() {
    let memtable = MemTable::new();

    memtable.set(b"key1".to_vec(), b"value1".to_vec());

    assert_eq!(memtable.get(b"key1"), Some(b"value1".to_vec()));
    assert_eq!(memtable.size(), (1, 0));
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = MemTable::new();
    assert_eq!(memtable.get(b"nonexistent"), None);
    assert!(!memtable.is_deleted(b"nonexistent"));
}

#[test]
fn test_set_overwrites_existing() {
    let memtable = MemTable::new();

    memtable.set(b"key1".to_vec(), b"value1".to_vec());
    memtable.set(b"key1".to_vec(), b"value2".to_vec());

    assert_eq!(memtable.size(), (1, 0));
    assert_eq!(memtable.get(b"key1"), Some(b"value2".to_vec()));
}

// =============================================================================
// Delete / Tombstone Tests
// =============================================================================

#[test]
fn test_delete_returns_previous_value() {
    let memtable = MemTable::new();

    memtable.set(b"key1".to_vec(), b"value1".to_vec());
    let previous = memtable.delete(b"key1".to_vec());

    assert_eq!(previous, Some(b"value1".to_vec()));
    assert_eq!(memtable.get(b"key1"), None);
    assert!(memtable.is_deleted(b"key1"));
    assert_eq!(memtable.size(), (0, 1));
}

#[test]
fn test_delete_nonexistent_key_still_records_tombstone() {
    let memtable = MemTable::new();

    let previous = memtable.delete(b"ghost".to_vec());

    assert_eq!(previous, None);
    assert!(memtable.is_deleted(b"ghost"));
    assert_eq!(memtable.size(), (0, 1));
    assert!(!memtable.is_empty());
}

#[test]
fn test_set_after_delete_lifts_tombstone() {
    let memtable = MemTable::new();

    memtable.delete(b"key1".to_vec());
    memtable.set(b"key1".to_vec(), b"back".to_vec());

    assert!(!memtable.is_deleted(b"key1"));
    assert_eq!(memtable.get(b"key1"), Some(b"back".to_vec()));
    assert_eq!(memtable.size(), (1, 0));
}

#[test]
fn test_key_never_live_and_tombstoned() {
    let memtable = MemTable::new();

    for round in 0..10u8 {
        memtable.set(b"k".to_vec(), vec![round]);
        assert!(!(memtable.get(b"k").is_some() && memtable.is_deleted(b"k")));
        memtable.delete(b"k".to_vec());
        assert!(!(memtable.get(b"k").is_some() && memtable.is_deleted(b"k")));
    }

    let (live, tombstones) = memtable.size();
    assert_eq!(live + tombstones, 1);
}

// =============================================================================
// Threshold Tests
// =============================================================================

#[test]
fn test_exceeds_on_live_count() {
    let memtable = MemTable::new();
    memtable.set(b"a".to_vec(), b"1".to_vec());
    memtable.set(b"b".to_vec(), b"2".to_vec());

    assert!(!memtable.exceeds(3));
    memtable.set(b"c".to_vec(), b"3".to_vec());
    assert!(memtable.exceeds(3));
}

#[test]
fn test_exceeds_on_tombstone_count() {
    let memtable = MemTable::new();
    memtable.delete(b"a".to_vec());
    memtable.delete(b"b".to_vec());

    assert!(memtable.exceeds(2));
    assert!(!memtable.exceeds(3));
}

// =============================================================================
// Snapshot / Clear Tests
// =============================================================================

#[test]
fn test_snapshot_is_key_ordered() {
    let memtable = MemTable::new();
    memtable.set(b"cherry".to_vec(), b"3".to_vec());
    memtable.set(b"apple".to_vec(), b"1".to_vec());
    memtable.set(b"banana".to_vec(), b"2".to_vec());
    memtable.delete(b"zucchini".to_vec());
    memtable.delete(b"date".to_vec());

    let snapshot = memtable.snapshot();

    let keys: Vec<Vec<u8>> = snapshot.live.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec()]
    );
    assert_eq!(snapshot.tombstones, vec![b"date".to_vec(), b"zucchini".to_vec()]);
    assert_eq!(snapshot.entry_count(), 5);
}

#[test]
fn test_snapshot_is_detached_copy() {
    let memtable = MemTable::new();
    memtable.set(b"a".to_vec(), b"1".to_vec());

    let snapshot = memtable.snapshot();
    memtable.set(b"b".to_vec(), b"2".to_vec());

    assert_eq!(snapshot.live.len(), 1);
    assert_eq!(memtable.size(), (2, 0));
}

#[test]
fn test_clear_resets_both_maps() {
    let memtable = MemTable::new();
    memtable.set(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), (0, 0));
    assert!(!memtable.is_deleted(b"b"));
    assert!(memtable.snapshot().is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_disjoint_keys() {
    let memtable = Arc::new(MemTable::new());
    let mut handles = Vec::new();

    for t in 0..8 {
        let memtable = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                memtable.set(format!("t{}-k{}", t, i).into_bytes(), vec![t as u8]);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(memtable.size(), (2000, 0));
    assert_eq!(memtable.get(b"t3-k100"), Some(vec![3]));
}

#[test]
fn test_concurrent_set_delete_same_key_keeps_invariant() {
    let memtable = Arc::new(MemTable::new());

    let setter = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 0..1000u32 {
                memtable.set(b"shared".to_vec(), i.to_be_bytes().to_vec());
            }
        })
    };
    let deleter = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for _ in 0..1000 {
                memtable.delete(b"shared".to_vec());
            }
        })
    };

    setter.join().unwrap();
    deleter.join().unwrap();

    let (live, tombstones) = memtable.size();
    assert_eq!(live + tombstones, 1);
}
