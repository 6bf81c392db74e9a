//! Segment Reader
//!
//! Parses a segment header and answers point lookups by linear scan.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::codec::{SegmentEntry, SegmentHeader};
use crate::error::Result;
use crate::storage::LookupResult;

use super::iterator::SegmentIterator;

/// Reader over one segment file
pub struct SegmentReader {
    path: PathBuf,
    file: BufReader<File>,
    header: SegmentHeader,
}

impl SegmentReader {
    /// Open a segment and parse its header
    ///
    /// Fails with `SegError::Format` on a bad magic, unknown version or
    /// truncated header.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let header = SegmentHeader::decode(&mut file)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
        })
    }

    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> u32 {
        self.header.entry_count
    }

    /// Length-based candidate filter from the header
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.header.might_contain(key)
    }

    /// Iterate over every entry from the start
    pub fn iter(&mut self) -> Result<SegmentIterator<'_>> {
        self.file
            .seek(SeekFrom::Start(self.header.encoded_len() as u64))?;
        Ok(SegmentIterator::new(&mut self.file, self.header.entry_count))
    }

    /// Look a key up in this segment
    ///
    /// A matching Set entry is remembered and the scan continues, because a
    /// later Delete entry for the same key overrides it. A matching Delete
    /// returns `Deleted` at once.
    pub fn lookup(&mut self, key: &[u8]) -> Result<LookupResult> {
        if !self.might_contain(key) {
            return Ok(LookupResult::NotFound);
        }

        let mut found = None;
        for entry in self.iter()? {
            match entry? {
                SegmentEntry::Set { key: k, value } if k == key => found = Some(value),
                SegmentEntry::Delete { key: k } if k == key => return Ok(LookupResult::Deleted),
                _ => {}
            }
        }

        Ok(found.map_or(LookupResult::NotFound, LookupResult::Found))
    }
}
