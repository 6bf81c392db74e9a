//! Segment Builder
//!
//! Writes a memtable's contents to a new segment file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

use crate::codec::{self, SegmentHeader, FORMAT_VERSION};
use crate::error::{Result, SegError};

use super::{SegmentMeta, TMP_SUFFIX};

/// Shortest and longest key seen so far
///
/// Ties go to the most recently observed key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBounds {
    smallest: Option<Vec<u8>>,
    largest: Option<Vec<u8>>,
}

impl KeyBounds {
    pub fn observe(&mut self, key: &[u8]) {
        if self.smallest.as_ref().map_or(true, |s| key.len() <= s.len()) {
            self.smallest = Some(key.to_vec());
        }
        if self.largest.as_ref().map_or(true, |l| key.len() >= l.len()) {
            self.largest = Some(key.to_vec());
        }
    }

    /// Fold in bounds observed after every key of `self`
    pub fn absorb(&mut self, later: KeyBounds) {
        if let Some(smallest) = later.smallest {
            if self.smallest.as_ref().map_or(true, |s| smallest.len() <= s.len()) {
                self.smallest = Some(smallest);
            }
        }
        if let Some(largest) = later.largest {
            if self.largest.as_ref().map_or(true, |l| largest.len() >= l.len()) {
                self.largest = Some(largest);
            }
        }
    }

    pub fn smallest(&self) -> &[u8] {
        self.smallest.as_deref().unwrap_or_default()
    }

    pub fn largest(&self) -> &[u8] {
        self.largest.as_deref().unwrap_or_default()
    }
}

/// Builder for a new segment
///
/// Set entries and Delete entries are buffered separately so the file
/// always lists every Set before any Delete, whatever order they were
/// added in. Bounds are computed as if all Set keys were scanned first.
pub struct SegmentBuilder {
    /// Output file path
    path: PathBuf,
    /// Encoded Set entries
    sets: BytesMut,
    /// Encoded Delete entries
    deletes: BytesMut,
    set_count: u64,
    delete_count: u64,
    set_bounds: KeyBounds,
    delete_bounds: KeyBounds,
}

impl SegmentBuilder {
    /// Create a builder targeting `path`; nothing touches disk until `finish`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sets: BytesMut::new(),
            deletes: BytesMut::new(),
            set_count: 0,
            delete_count: 0,
            set_bounds: KeyBounds::default(),
            delete_bounds: KeyBounds::default(),
        }
    }

    /// Add a live key-value pair
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        codec::encode_entry(&mut self.sets, key, Some(value))?;
        self.set_bounds.observe(key);
        self.set_count += 1;
        Ok(())
    }

    /// Add a tombstone
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        codec::encode_entry(&mut self.deletes, key, None)?;
        self.delete_bounds.observe(key);
        self.delete_count += 1;
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.set_count + self.delete_count
    }

    /// Write header, entries and checksum, then move the file into place
    ///
    /// The bytes go to `<path>.tmp` first and are renamed after an fsync,
    /// so a listed segment is always complete.
    pub fn finish(self) -> Result<SegmentMeta> {
        let entry_count = u32::try_from(self.entry_count()).map_err(|_| {
            SegError::Format(format!("{} entries exceed segment limit", self.entry_count()))
        })?;

        let mut bounds = self.set_bounds;
        bounds.absorb(self.delete_bounds);

        let header = SegmentHeader {
            entry_count,
            smallest_key: bounds.smallest().to_vec(),
            largest_key: bounds.largest().to_vec(),
            version: FORMAT_VERSION,
        };

        let mut out = BytesMut::with_capacity(
            header.encoded_len() + self.sets.len() + self.deletes.len() + codec::CHECKSUM_SIZE,
        );
        header.encode(&mut out)?;
        out.extend_from_slice(&self.sets);
        out.extend_from_slice(&self.deletes);

        let checksum = crc32fast::hash(&out);
        out.put_u32(checksum);

        let tmp_path = tmp_path_for(&self.path);
        if let Err(e) = write_synced(&tmp_path, &out) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &self.path)?;

        Ok(SegmentMeta {
            path: self.path,
            entry_count,
            smallest_key: header.smallest_key,
            largest_key: header.largest_key,
            file_size: out.len() as u64,
            checksum,
        })
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
