//! Binary Codec
//!
//! Every big-endian, length-prefixed encoding in SegKV goes through this
//! module. The durability log, the segment builder and the segment reader
//! all use the same primitives, so the on-disk formats stay symmetric.
//!
//! ## Segment Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header                                                       │
//! │   Magic u32 | EntryCount u32                                 │
//! │   SmallestKeyLen u32 | SmallestKey | LargestKeyLen u32 | ... │
//! │   LargestKey | Version u16                                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Entries (Set entries first, then Delete entries)             │
//! │   'S' | KeyLen u32 | Key | ValueLen u32 | Value              │
//! │   'D' | KeyLen u32 | Key                                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Checksum u32 (CRC-32 IEEE over every preceding byte)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::io::{self, Read};

use bytes::{BufMut, BytesMut};

use crate::error::{Result, SegError};

/// Magic constant opening every segment file
pub const MAGIC: u32 = 0x2310_2003;

/// Current segment format version
pub const FORMAT_VERSION: u16 = 1;

/// Size of the trailing checksum
pub const CHECKSUM_SIZE: usize = 4;

// =============================================================================
// Record Tags
// =============================================================================

/// One-byte action tag shared by log records and segment entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Set = b'S',
    Delete = b'D',
}

impl Tag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(Tag::Set),
            b'D' => Some(Tag::Delete),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// Append `bytes` prefixed by its length as a big-endian u32
pub fn put_len_prefixed(buf: &mut BytesMut, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        SegError::Format(format!("field of {} bytes exceeds u32 length prefix", bytes.len()))
    })?;
    buf.put_u32(len);
    buf.put_slice(bytes);
    Ok(())
}

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

pub fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut raw = [0u8; 2];
    reader.read_exact(&mut raw)?;
    Ok(u16::from_be_bytes(raw))
}

pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut raw = [0u8; 4];
    reader.read_exact(&mut raw)?;
    Ok(u32::from_be_bytes(raw))
}

/// Read a u32 length followed by that many bytes
///
/// Reads through `take` so a corrupt length cannot force a huge allocation
/// before the short read is noticed.
pub fn read_len_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut bytes = Vec::new();
    reader.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, bytes.len()),
        ));
    }
    Ok(bytes)
}

/// Map a short read to a format error naming what was being parsed
fn truncated(what: &'static str) -> impl FnOnce(io::Error) -> SegError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SegError::Format(format!("truncated {}", what))
        } else {
            SegError::Io(e)
        }
    }
}

// =============================================================================
// Segment Header
// =============================================================================

/// Parsed segment header
///
/// `smallest_key`/`largest_key` are the shortest and longest keys in the
/// segment. They bound key *length*, not key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub entry_count: u32,
    pub smallest_key: Vec<u8>,
    pub largest_key: Vec<u8>,
    pub version: u16,
}

impl SegmentHeader {
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32(MAGIC);
        buf.put_u32(self.entry_count);
        put_len_prefixed(buf, &self.smallest_key)?;
        put_len_prefixed(buf, &self.largest_key)?;
        buf.put_u16(self.version);
        Ok(())
    }

    /// Decode a header, rejecting foreign files by magic
    ///
    /// The version is informational: an unknown one is logged and the
    /// entries are still read with the current layout.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = read_u32(reader).map_err(truncated("segment magic"))?;
        if magic != MAGIC {
            return Err(SegError::Format(format!(
                "invalid segment magic: expected {:#010x}, got {:#010x}",
                MAGIC, magic
            )));
        }

        let entry_count = read_u32(reader).map_err(truncated("segment header"))?;
        let smallest_key = read_len_prefixed(reader).map_err(truncated("segment header"))?;
        let largest_key = read_len_prefixed(reader).map_err(truncated("segment header"))?;
        let version = read_u16(reader).map_err(truncated("segment header"))?;

        if version != FORMAT_VERSION {
            tracing::warn!(version, expected = FORMAT_VERSION, "segment has unknown format version");
        }

        Ok(Self {
            entry_count,
            smallest_key,
            largest_key,
            version,
        })
    }

    /// Number of bytes `encode` produces
    pub fn encoded_len(&self) -> usize {
        4 + 4 + 4 + self.smallest_key.len() + 4 + self.largest_key.len() + 2
    }

    /// Length-based candidate filter: never rejects a key the segment holds
    pub fn might_contain(&self, key: &[u8]) -> bool {
        within_length_bounds(&self.smallest_key, &self.largest_key, key)
    }
}

/// True when `key` is no shorter than `smallest` and no longer than `largest`
///
/// The bounds order keys by length only, so this is the whole pruning rule.
pub fn within_length_bounds(smallest: &[u8], largest: &[u8], key: &[u8]) -> bool {
    smallest.len() <= key.len() && key.len() <= largest.len()
}

// =============================================================================
// Segment Entries
// =============================================================================

/// A single entry in a segment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentEntry {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl SegmentEntry {
    pub fn key(&self) -> &[u8] {
        match self {
            SegmentEntry::Set { key, .. } | SegmentEntry::Delete { key } => key,
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            SegmentEntry::Set { .. } => Tag::Set,
            SegmentEntry::Delete { .. } => Tag::Delete,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            SegmentEntry::Set { key, value } => encode_entry(buf, key, Some(value.as_slice())),
            SegmentEntry::Delete { key } => encode_entry(buf, key, None),
        }
    }

    pub fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let byte = read_u8(reader).map_err(truncated("segment entry"))?;
        let tag = Tag::from_byte(byte).ok_or_else(|| {
            SegError::Format(format!("unknown segment entry tag: 0x{:02x}", byte))
        })?;

        let key = read_len_prefixed(reader).map_err(truncated("segment entry key"))?;
        match tag {
            Tag::Set => {
                let value = read_len_prefixed(reader).map_err(truncated("segment entry value"))?;
                Ok(SegmentEntry::Set { key, value })
            }
            Tag::Delete => Ok(SegmentEntry::Delete { key }),
        }
    }
}

/// Encode a borrowed Set (`Some(value)`) or Delete (`None`) entry
pub fn encode_entry(buf: &mut BytesMut, key: &[u8], value: Option<&[u8]>) -> Result<()> {
    match value {
        Some(value) => {
            buf.put_u8(Tag::Set.as_byte());
            put_len_prefixed(buf, key)?;
            put_len_prefixed(buf, value)?;
        }
        None => {
            buf.put_u8(Tag::Delete.as_byte());
            put_len_prefixed(buf, key)?;
        }
    }
    Ok(())
}
