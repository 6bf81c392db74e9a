//! Server replies

use crate::error::SegError;

/// Reply status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    /// GET of an absent key, or DELETE with nothing visible before it
    NotFound = 0x01,
    Error = 0x02,
}

impl TryFrom<u8> for Status {
    type Error = SegError;

    fn try_from(byte: u8) -> Result<Self, SegError> {
        match byte {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::NotFound),
            0x02 => Ok(Status::Error),
            other => Err(SegError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                other
            ))),
        }
    }
}

/// A reply frame; an empty payload decodes as `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// ERROR carrying a UTF-8 message
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Reply for a successful engine call
    ///
    /// `expects_value` comes from [`Command::expects_value`](super::Command::expects_value):
    /// a missing value is NOT_FOUND for GET/DELETE and a bare OK otherwise.
    pub fn for_value(value: Option<Vec<u8>>, expects_value: bool) -> Self {
        match value {
            Some(value) => Self::ok(Some(value)),
            None if expects_value => Self::not_found(),
            None => Self::ok(None),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
