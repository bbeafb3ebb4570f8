//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Invocation) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Invocation Payload
//! - name_len (4 bytes) + function name (UTF-8)
//! - argc (4 bytes)
//! - argc × (arg_len (4 bytes) + arg (UTF-8))
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All lengths are big-endian.

use std::io::{Read, Write};

use crate::error::{LedgerError, Result};

use super::{Invocation, Response, Status};

/// Header size: 1 byte tag/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Tag of an invocation frame
pub const INVOKE_TAG: u8 = 0x10;

// =============================================================================
// Invocation Encoding/Decoding
// =============================================================================

/// Encode an invocation to bytes
///
/// Format: tag (1) + payload_len (4) + payload
pub fn encode_invocation(invocation: &Invocation) -> Vec<u8> {
    let args_len: usize = invocation.args.iter().map(|a| 4 + a.len()).sum();
    let mut payload = Vec::with_capacity(8 + invocation.function.len() + args_len);

    put_str(&mut payload, &invocation.function);
    payload.extend_from_slice(&(invocation.args.len() as u32).to_be_bytes());
    for arg in &invocation.args {
        put_str(&mut payload, arg);
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(INVOKE_TAG);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);

    message
}

/// Decode an invocation from bytes
pub fn decode_invocation(bytes: &[u8]) -> Result<Invocation> {
    let (tag, payload) = split_frame(bytes, "invocation")?;

    if tag != INVOKE_TAG {
        return Err(LedgerError::Protocol(format!(
            "Unknown request tag: 0x{:02x}",
            tag
        )));
    }

    let mut cursor = PayloadCursor::new(payload);
    let function = cursor.take_str("function name")?;
    let argc = cursor.take_u32("argument count")? as usize;

    // Every argument needs at least its 4-byte length
    if argc > cursor.remaining() / 4 {
        return Err(LedgerError::Protocol(format!(
            "Argument count {} exceeds payload",
            argc
        )));
    }

    let mut args = Vec::with_capacity(argc);
    for i in 0..argc {
        args.push(cursor.take_str(&format!("argument {}", i))?);
    }

    if cursor.remaining() > 0 {
        return Err(LedgerError::Protocol(format!(
            "Invocation: {} trailing bytes",
            cursor.remaining()
        )));
    }

    Ok(Invocation { function, args })
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Reads length-prefixed fields out of a payload
struct PayloadCursor<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { payload, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    fn take_u32(&mut self, what: &str) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(LedgerError::Protocol(format!("Invocation: missing {}", what)));
        }
        let p = &self.payload[self.pos..self.pos + 4];
        self.pos += 4;
        Ok(u32::from_be_bytes([p[0], p[1], p[2], p[3]]))
    }

    fn take_str(&mut self, what: &str) -> Result<String> {
        let len = self.take_u32(what)? as usize;
        if self.remaining() < len {
            return Err(LedgerError::Protocol(format!(
                "Invocation: incomplete {} (expected {}, got {})",
                what,
                len,
                self.remaining()
            )));
        }
        let bytes = &self.payload[self.pos..self.pos + len];
        self.pos += len;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| LedgerError::Protocol(format!("Invocation: {} is not UTF-8", what)))
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
///
/// A payload over `MAX_PAYLOAD_SIZE` cannot be read by any client, so it
/// is replaced by an error response naming its size.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);

    match u32::try_from(payload.len()) {
        Ok(len) if len <= MAX_PAYLOAD_SIZE => frame_response(response.status, len, payload),
        _ => {
            tracing::warn!(
                len = payload.len(),
                max = MAX_PAYLOAD_SIZE,
                "response payload too large, sending error instead"
            );
            let message = format!(
                "Response too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            );
            frame_response(Status::Error, message.len() as u32, message.as_bytes())
        }
    }
}

fn frame_response(status: Status, len: u32, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(status as u8);
    message.extend_from_slice(&len.to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(LedgerError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

/// Validate a frame header and return (tag, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(LedgerError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(LedgerError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(LedgerError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one header + payload frame from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(LedgerError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload_len);
    message.extend_from_slice(&header);
    message.resize(HEADER_SIZE + payload_len, 0);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete invocation from a stream
///
/// Blocks until a complete invocation is received or an error occurs
pub fn read_invocation<R: Read>(reader: &mut R) -> Result<Invocation> {
    decode_invocation(&read_frame(reader)?)
}

/// Write an invocation to a stream
pub fn write_invocation<W: Write>(writer: &mut W, invocation: &Invocation) -> Result<()> {
    writer.write_all(&encode_invocation(invocation))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
