//! MemTable implementation

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;

/// In-memory table for recent writes
///
/// Every operation takes the one internal lock, so callers on any thread
/// see `live` and `tombstones` change together.
pub struct MemTable {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    live: BTreeMap<Vec<u8>, Vec<u8>>,
    tombstones: BTreeSet<Vec<u8>>,
}

/// Owned copy of a memtable, in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemTableSnapshot {
    pub live: Vec<(Vec<u8>, Vec<u8>)>,
    pub tombstones: Vec<Vec<u8>>,
}

impl MemTableSnapshot {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.tombstones.is_empty()
    }

    /// Entries a segment built from this snapshot will hold
    pub fn entry_count(&self) -> usize {
        self.live.len() + self.tombstones.len()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Upsert a value and lift any tombstone on the key
    pub fn set(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut inner = self.inner.lock();
        inner.tombstones.remove(&key);
        inner.live.insert(key, value);
    }

    /// Live value for `key`
    ///
    /// `None` does not mean the key is absent everywhere: check
    /// [`is_deleted`](Self::is_deleted) before falling through to segments.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().live.get(key).cloned()
    }

    /// Remove the live value (if any) and record a tombstone
    ///
    /// Returns the previous live value; `None` still records the tombstone.
    pub fn delete(&self, key: Vec<u8>) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let previous = inner.live.remove(&key);
        inner.tombstones.insert(key);
        previous
    }

    pub fn is_deleted(&self, key: &[u8]) -> bool {
        self.inner.lock().tombstones.contains(key)
    }

    /// Reset both maps in one step
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.live.clear();
        inner.tombstones.clear();
    }

    /// `(live_count, tombstone_count)`
    pub fn size(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        (inner.live.len(), inner.tombstones.len())
    }

    /// True once either map holds at least `threshold` keys
    pub fn exceeds(&self, threshold: usize) -> bool {
        let (live, tombstones) = self.size();
        live >= threshold || tombstones >= threshold
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.live.is_empty() && inner.tombstones.is_empty()
    }

    /// Copy both maps out under the lock
    pub fn snapshot(&self) -> MemTableSnapshot {
        let inner = self.inner.lock();
        MemTableSnapshot {
            live: inner
                .live
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            tombstones: inner.tombstones.iter().cloned().collect(),
        }
    }
}
