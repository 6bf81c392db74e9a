//! Segment Module
//!
//! Immutable on-disk segment files produced by memtable flushes.
//!
//! Encoding lives in [`crate::codec`]; this module owns file naming,
//! building and reading.

mod builder;
mod iterator;
mod reader;

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::Result;

pub use builder::{KeyBounds, SegmentBuilder};
pub use iterator::SegmentIterator;
pub use reader::SegmentReader;

/// File extension of a finished segment
pub const SEGMENT_EXTENSION: &str = "seg";

/// Suffix of a segment still being written
pub(crate) const TMP_SUFFIX: &str = ".tmp";

// =============================================================================
// Segment Metadata
// =============================================================================

/// Metadata of a segment that was just written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    /// Path to the segment file
    pub path: PathBuf,
    /// Number of entries (Set + Delete)
    pub entry_count: u32,
    /// Shortest key in the segment
    pub smallest_key: Vec<u8>,
    /// Longest key in the segment
    pub largest_key: Vec<u8>,
    /// File size in bytes, trailer included
    pub file_size: u64,
    /// Stored CRC-32 trailer
    pub checksum: u32,
}

impl SegmentMeta {
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Length-based candidate check, same rule the reader applies
    pub fn might_contain(&self, key: &[u8]) -> bool {
        codec::within_length_bounds(&self.smallest_key, &self.largest_key, key)
    }
}

// =============================================================================
// File Naming
// =============================================================================

/// Path of the segment with the given id
///
/// Ids are zero-padded so lexicographic order matches creation order.
pub fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("segment_{:020}.{}", id, SEGMENT_EXTENSION))
}

/// Parse a segment id from its filename
/// "segment_00000000000000000042.seg" → Some(42)
pub fn parse_segment_id(path: &Path) -> Option<u64> {
    if path.extension()? != SEGMENT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("segment_")?.parse().ok()
}

/// All finished segments in `dir`, oldest first
pub fn list_segments(dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(id) = parse_segment_id(&path) {
            segments.push((id, path));
        }
    }
    segments.sort_by_key(|(id, _)| *id);
    Ok(segments)
}
