//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ### Payload by Command Type
//! - GET:    key_len (4 bytes) + key
//! - SET:    key_len (4 bytes) + key + value
//! - DELETE: key_len (4 bytes) + key
//! - PING:   empty
//!
//! Every frame, request or response, is `kind (1) | payload_len (4) | payload`.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::put_len_prefixed;
use crate::error::{Result, SegError};

use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

fn encode_frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u8(kind);
    frame.put_u32(payload.len() as u32);
    frame.put_slice(payload);
    frame.to_vec()
}

/// Split a complete frame into its kind byte and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(SegError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = checked_payload_len(header.get_u32(), what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(SegError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn checked_payload_len(len: u32, what: &str) -> Result<usize> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(SegError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

/// Read one whole frame from a stream
///
/// Blocks until the frame is complete; the length is checked before the
/// payload buffer is allocated.
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = checked_payload_len(
        u32::from_be_bytes([header[1], header[2], header[3], header[4]]),
        what,
    )?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_SIZE..])?;
    Ok(frame)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut payload = BytesMut::new();
    match command {
        Command::Get { key } | Command::Delete { key } => put_len_prefixed(&mut payload, key)?,
        Command::Set { key, value } => {
            put_len_prefixed(&mut payload, key)?;
            payload.put_slice(value);
        }
        Command::Ping => {}
    }

    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(SegError::Protocol(format!(
            "Command payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    Ok(encode_frame(command.command_type() as u8, &payload))
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (kind, payload) = split_frame(bytes, "command")?;

    match CommandType::try_from(kind)? {
        CommandType::Get => {
            let (key, _) = split_key(payload, "GET")?;
            Ok(Command::Get { key })
        }
        CommandType::Set => {
            let (key, value) = split_key(payload, "SET")?;
            Ok(Command::Set { key, value })
        }
        CommandType::Delete => {
            let (key, _) = split_key(payload, "DELETE")?;
            Ok(Command::Delete { key })
        }
        CommandType::Ping if payload.is_empty() => Ok(Command::Ping),
        CommandType::Ping => Err(SegError::Protocol(format!(
            "PING command: unexpected payload of {} bytes",
            payload.len()
        ))),
    }
}

/// Split `key_len (4) | key | rest` into the key and the remaining bytes
fn split_key(mut payload: &[u8], name: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    if payload.remaining() < 4 {
        return Err(SegError::Protocol(format!("{} command: missing key length", name)));
    }

    let key_len = payload.get_u32() as usize;
    if payload.remaining() < key_len {
        return Err(SegError::Protocol(format!(
            "{} command: incomplete key (expected {}, got {})",
            name,
            key_len,
            payload.remaining()
        )));
    }

    let key = payload[..key_len].to_vec();
    let rest = payload[key_len..].to_vec();
    Ok((key, rest))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    encode_frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (kind, payload) = split_frame(bytes, "response")?;

    let status = Status::try_from(kind)?;
    let payload = (!payload.is_empty()).then(|| payload.to_vec());
    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader, "command")?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader, "response")?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
