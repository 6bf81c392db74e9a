//! WAL Recovery
//!
//! Rebuilds lost memtable state by replaying the durability log.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{LogRecord, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of complete records read
    pub records_recovered: u64,

    /// Bytes covered by complete records
    pub valid_bytes: u64,

    /// Trailing bytes that did not form a complete record
    pub bytes_discarded: u64,

    /// Whether a partial or undecodable tail was found
    pub corrupt_tail: bool,
}

impl WalRecovery {
    /// Read every complete record in write order, leaving the file untouched
    ///
    /// A missing file recovers as empty.
    pub fn recover(path: &Path) -> Result<(Vec<LogRecord>, RecoveryResult)> {
        if !path.exists() {
            return Ok((Vec::new(), RecoveryResult::default()));
        }

        let reader = WalReader::open(path)?;
        let mut iter = reader.iter();
        let records: Vec<LogRecord> = iter.by_ref().collect();

        let result = RecoveryResult {
            records_recovered: records.len() as u64,
            valid_bytes: iter.valid_len(),
            bytes_discarded: reader.len() as u64 - iter.valid_len(),
            corrupt_tail: iter.corrupt_tail(),
        };

        if result.corrupt_tail {
            tracing::warn!(
                path = %path.display(),
                discarded = result.bytes_discarded,
                "WAL ends with a partial record; discarding tail"
            );
        }

        Ok((records, result))
    }

    /// Read every record, then truncate the log to empty
    pub fn replay(path: &Path) -> Result<Vec<LogRecord>> {
        let (records, _) = Self::recover(path)?;
        if path.exists() {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(0)?;
            file.sync_all()?;
        }
        Ok(records)
    }

    /// Inspect a WAL file without returning records
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::recover(path).map(|(_, result)| result)
    }
}
