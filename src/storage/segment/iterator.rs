//! Segment Iterator
//!
//! Sequential iteration over every entry of a segment, in on-disk order.

use std::fs::File;
use std::io::BufReader;

use crate::codec::SegmentEntry;
use crate::error::Result;

/// Iterator over segment entries: all Set entries, then all Delete entries
pub struct SegmentIterator<'a> {
    file: &'a mut BufReader<File>,
    /// Entries left according to the header
    remaining: u32,
    /// Set after the first decode error; iteration ends there
    failed: bool,
}

impl<'a> SegmentIterator<'a> {
    /// `file` must be positioned at the first entry
    pub(super) fn new(file: &'a mut BufReader<File>, entry_count: u32) -> Self {
        Self {
            file,
            remaining: entry_count,
            failed: false,
        }
    }
}

impl Iterator for SegmentIterator<'_> {
    type Item = Result<SegmentEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }

        match SegmentEntry::decode(&mut *self.file) {
            Ok(entry) => {
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}
