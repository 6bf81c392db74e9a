//! WAL Reader
//!
//! Loads the whole log into memory and yields records in write order.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::Result;

use super::LogRecord;

/// Reads records from a durability log file
pub struct WalReader {
    data: Vec<u8>,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self { data })
    }

    /// Build a reader over bytes already in memory
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Total bytes in the log
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all complete records
    pub fn iter(&self) -> WalIterator<'_> {
        WalIterator {
            cursor: Cursor::new(self.data.as_slice()),
            valid_len: 0,
            corrupt_tail: false,
        }
    }
}

/// Iterator over log records
///
/// Stops at end of file or at the first record that cannot be decoded.
/// Appends are not fsynced per record, so a partial final record is an
/// expected crash artifact and simply ends the stream.
pub struct WalIterator<'a> {
    cursor: Cursor<&'a [u8]>,
    valid_len: u64,
    corrupt_tail: bool,
}

impl WalIterator<'_> {
    /// Bytes covered by the records yielded so far
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }

    /// True once iteration stopped on an undecodable tail
    pub fn corrupt_tail(&self) -> bool {
        self.corrupt_tail
    }
}

impl Iterator for WalIterator<'_> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.corrupt_tail || self.valid_len >= self.cursor.get_ref().len() as u64 {
            return None;
        }

        match LogRecord::decode(&mut self.cursor) {
            Ok(record) => {
                self.valid_len = self.cursor.position();
                Some(record)
            }
            Err(e) => {
                tracing::debug!(offset = self.valid_len, error = %e, "WAL iteration stopped");
                self.corrupt_tail = true;
                None
            }
        }
    }
}
