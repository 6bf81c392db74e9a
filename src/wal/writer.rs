//! WAL Writer
//!
//! Appends records to the durability log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::LogRecord;

/// Writes records to the WAL file
///
/// Every append is handed to the OS before returning; fsync frequency is
/// governed by the [`WalSyncStrategy`]. Callers serialize access (the
/// engine keeps the writer behind a mutex), so records never interleave.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    sync_strategy: WalSyncStrategy,
    /// Current file length in bytes
    len: u64,
    /// Records appended since the last fsync
    unsynced: usize,
    /// Records appended since open or the last truncate
    records: u64,
}

impl WalWriter {
    /// Open or create a WAL file, appending after any existing content
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy,
            len,
            unsynced: 0,
            records: 0,
        })
    }

    /// Append a record to the WAL
    ///
    /// On a failed write the file is cut back to its previous length so a
    /// torn record never sits in front of later appends.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        let bytes = record.encode()?;

        if let Err(e) = self.file.write_all(&bytes) {
            tracing::error!(path = %self.path.display(), error = %e, "WAL append failed");
            if let Err(rollback) = self.file.set_len(self.len) {
                tracing::error!(error = %rollback, "WAL rollback after failed append failed");
            }
            return Err(e.into());
        }

        self.len += bytes.len() as u64;
        self.records += 1;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Discard every record (after its content is durable in a segment)
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.len = 0;
        self.unsynced = 0;
        self.records = 0;
        tracing::debug!(path = %self.path.display(), "WAL truncated");
        Ok(())
    }

    /// Records appended since open or the last truncate
    pub fn records_since_truncate(&self) -> u64 {
        self.records
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
