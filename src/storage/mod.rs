//! Storage Module
//!
//! Persistent storage layer built from immutable segment files.
//!
//! ## Responsibilities
//! - Turn memtable snapshots into new segments
//! - Answer lookups newest segment → oldest
//! - Verify segment checksums
//!
//! There is no compaction: segments accumulate and every lookup may scan
//! all of them.

mod integrity;
mod manager;
pub mod segment;

pub use integrity::{IntegrityChecker, IntegrityReport, IntegrityStatus};
pub use manager::StorageManager;
pub use segment::{SegmentBuilder, SegmentIterator, SegmentMeta, SegmentReader};

/// Outcome of looking a key up in segment files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// Newest segment mentioning the key holds this value
    Found(Vec<u8>),
    /// A segment holds a tombstone for the key
    Deleted,
    /// No segment mentions the key
    NotFound,
}

impl LookupResult {
    /// Collapse to the external view, where deleted and absent look the same
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            LookupResult::Found(value) => Some(value),
            LookupResult::Deleted | LookupResult::NotFound => None,
        }
    }
}
