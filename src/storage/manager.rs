//! Storage Manager
//!
//! Owns the segment directory and coordinates flushes and lookups.
//!
//! ## Responsibilities
//! - Discover existing segments on startup
//! - Search segments newest → oldest for reads
//! - Create new segments from memtable snapshots
//! - Run the integrity check over the directory

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::memtable::MemTableSnapshot;

use super::integrity::{IntegrityChecker, IntegrityReport};
use super::segment::{self, SegmentBuilder, SegmentMeta, SegmentReader, TMP_SUFFIX};
use super::LookupResult;

/// Manages the storage layer
///
/// ## Concurrency:
/// - `segments`: RwLock over the path list; lookups copy it and release
///   the lock before touching any file, so flushes never wait on a scan
/// - `next_segment_id`: atomic counter, so concurrent flushes can never
///   pick the same file name
/// - Segment files are immutable and opened per lookup; no file locking
pub struct StorageManager {
    /// Directory where segments are stored
    dir: PathBuf,

    /// Segment paths, ordered newest → oldest
    segments: RwLock<Vec<PathBuf>>,

    /// Next segment id
    next_segment_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove half-written `.tmp` files from an interrupted flush
    /// 3. Discover existing segments, newest first
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            let is_tmp = file_path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(TMP_SUFFIX));
            if is_tmp && file_path.is_file() {
                tracing::warn!(file = %file_path.display(), "removing incomplete segment");
                fs::remove_file(&file_path)?;
            }
        }

        let existing = segment::list_segments(path)?;
        let next_id = existing.last().map(|(id, _)| id + 1).unwrap_or(1);
        let segments: Vec<PathBuf> = existing.into_iter().rev().map(|(_, p)| p).collect();

        tracing::debug!(
            dir = %path.display(),
            segments = segments.len(),
            next_id,
            "storage opened"
        );

        Ok(Self {
            dir: path.to_path_buf(),
            segments: RwLock::new(segments),
            next_segment_id: AtomicU64::new(next_id),
        })
    }

    /// Look a key up across all segments, newest → oldest
    ///
    /// The first segment with any entry for the key decides: `Found` or
    /// `Deleted`. A segment that cannot be opened or parsed is logged and
    /// skipped so corrupt history never makes the whole store unreadable.
    pub fn lookup(&self, key: &[u8]) -> LookupResult {
        let segments = self.segments.read().clone();

        for path in &segments {
            let mut reader = match SegmentReader::open(path) {
                Ok(reader) => reader,
                Err(e) => {
                    tracing::warn!(segment = %path.display(), error = %e, "skipping unreadable segment");
                    continue;
                }
            };

            match reader.lookup(key) {
                Ok(LookupResult::NotFound) => continue,
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!(segment = %path.display(), error = %e, "skipping malformed segment");
                    continue;
                }
            }
        }

        LookupResult::NotFound
    }

    /// Write a snapshot to a new segment
    ///
    /// Returns `None` without creating a file when the snapshot is empty.
    pub fn flush(&self, snapshot: &MemTableSnapshot) -> Result<Option<SegmentMeta>> {
        if snapshot.is_empty() {
            return Ok(None);
        }

        let id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
        let path = segment::segment_path(&self.dir, id);

        let mut builder = SegmentBuilder::new(&path);
        for (key, value) in &snapshot.live {
            builder.add(key, value)?;
        }
        for key in &snapshot.tombstones {
            builder.add_tombstone(key)?;
        }
        let meta = builder.finish()?;

        // Keep newest-first order even if a flush with a lower id lands late
        let mut segments = self.segments.write();
        let pos = segments
            .iter()
            .position(|p| segment::parse_segment_id(p).map_or(true, |other| other < id))
            .unwrap_or(segments.len());
        segments.insert(pos, path);
        drop(segments);

        tracing::info!(
            segment = %meta.path.display(),
            entries = meta.entry_count,
            bytes = meta.file_size,
            "flushed memtable to segment"
        );

        Ok(Some(meta))
    }

    /// Verify every segment's checksum
    pub fn check_integrity(&self) -> Result<Vec<IntegrityReport>> {
        IntegrityChecker::check_all(&self.dir)
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Segment paths, newest first
    pub fn segment_paths(&self) -> Vec<PathBuf> {
        self.segments.read().clone()
    }

    /// Get the segment directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the next segment id (for testing/debugging)
    pub fn next_segment_id(&self) -> u64 {
        self.next_segment_id.load(Ordering::SeqCst)
    }
}
