//! Client requests

use crate::error::SegError;

/// Request opcode on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Set = 0x02,
    Delete = 0x03,
    Ping = 0x04,
}

impl TryFrom<u8> for CommandType {
    type Error = SegError;

    fn try_from(byte: u8) -> Result<Self, SegError> {
        match byte {
            0x01 => Ok(CommandType::Get),
            0x02 => Ok(CommandType::Set),
            0x03 => Ok(CommandType::Delete),
            0x04 => Ok(CommandType::Ping),
            other => Err(SegError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                other
            ))),
        }
    }
}

/// A decoded request, mapped one-to-one onto the engine API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8> },
    /// Answered with the value visible before the delete
    Delete { key: Vec<u8> },
    Ping,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Key the request targets; `None` for PING
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Command::Get { key } | Command::Set { key, .. } | Command::Delete { key } => Some(key),
            Command::Ping => None,
        }
    }

    /// Whether an absent result should be reported as NOT_FOUND
    pub fn expects_value(&self) -> bool {
        matches!(self, Command::Get { .. } | Command::Delete { .. })
    }
}
