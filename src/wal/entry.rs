//! WAL record definitions
//!
//! Defines the structure of individual durability log records.

use std::io::Read;

use bytes::{BufMut, BytesMut};

use crate::codec::{self, put_len_prefixed};
use crate::error::{Result, SegError};

pub use crate::codec::Tag as Action;

/// Smallest possible record: action (1) + key_len (4) + value_len (4)
pub const MIN_RECORD_SIZE: usize = 9;

/// A single mutation in the durability log
///
/// Layout: `action (1) | key_len (4) | key | value_len (4) | value`.
/// Deletes carry a zero-length value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub action: Action,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl LogRecord {
    pub fn set(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            action: Action::Set,
            key,
            value,
        }
    }

    pub fn delete(key: Vec<u8>) -> Self {
        Self {
            action: Action::Delete,
            key,
            value: Vec::new(),
        }
    }

    /// Bytes this record occupies on disk
    pub fn encoded_len(&self) -> usize {
        MIN_RECORD_SIZE + self.key.len() + self.value.len()
    }

    pub fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.action.as_byte());
        put_len_prefixed(&mut buf, &self.key)?;
        put_len_prefixed(&mut buf, &self.value)?;
        Ok(buf)
    }

    /// Decode one record
    ///
    /// A short read surfaces as `SegError::Io` with `UnexpectedEof`; an
    /// unknown action byte as `SegError::Format`.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let byte = codec::read_u8(reader)?;
        let action = Action::from_byte(byte)
            .ok_or_else(|| SegError::Format(format!("unknown WAL action: 0x{:02x}", byte)))?;
        let key = codec::read_len_prefixed(reader)?;
        let value = codec::read_len_prefixed(reader)?;
        Ok(Self { action, key, value })
    }
}
