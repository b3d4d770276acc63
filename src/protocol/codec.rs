//! Protocol codec
//!
//! Encoding and decoding of [`Value`] frames.
//!
//! Decoding is streaming: a header line is read up to CRLF, then exactly
//! the number of bytes or elements it declares. There is no lookahead past
//! the current frame, so the same reader can be used for a socket and for
//! the AOF file.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::Bytes;

use crate::error::{KvError, Result};
use super::Value;

/// Maximum bulk string length (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Maximum number of elements in one array
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Maximum header line length, excluding CRLF (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Maximum array nesting depth
pub const MAX_DEPTH: usize = 32;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to bytes
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

/// Append the encoding of a value to `out`
pub fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::SimpleString(text) => {
            out.push(b'+');
            out.extend_from_slice(text.as_bytes());
            out.extend_from_slice(CRLF);
        }
        Value::Error(message) => {
            out.push(b'-');
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(CRLF);
        }
        Value::Integer(n) => {
            out.push(b':');
            out.extend_from_slice(n.to_string().as_bytes());
            out.extend_from_slice(CRLF);
        }
        Value::Bulk(data) => {
            out.push(b'$');
            out.extend_from_slice(data.len().to_string().as_bytes());
            out.extend_from_slice(CRLF);
            out.extend_from_slice(data);
            out.extend_from_slice(CRLF);
        }
        Value::Null => out.extend_from_slice(b"$-1\r\n"),
        Value::Array(items) => {
            out.push(b'*');
            out.extend_from_slice(items.len().to_string().as_bytes());
            out.extend_from_slice(CRLF);
            for item in items {
                encode_into(item, out);
            }
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the first complete value in `bytes`
///
/// Empty or truncated input is [`KvError::Incomplete`].
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut cursor = bytes;
    read_value(&mut cursor)?.ok_or(KvError::Incomplete)
}

/// Read exactly one value from a stream
///
/// Returns `Ok(None)` if the stream ends cleanly before the first byte of a
/// frame. Ending anywhere inside a frame is [`KvError::Incomplete`].
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Option<Value>> {
    let mut line = Vec::new();
    if !read_line(reader, &mut line)? {
        return Ok(None);
    }
    parse_frame(reader, &line, 0).map(Some)
}

/// Read a header line into `buf` without its CRLF.
///
/// Returns false on EOF before any byte.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool> {
    buf.clear();
    let limit = (MAX_LINE_LEN + CRLF.len()) as u64;
    let read = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(false);
    }

    if !buf.ends_with(b"\n") {
        if read as u64 >= limit {
            return Err(KvError::Protocol("header line too long".to_string()));
        }
        return Err(KvError::Incomplete);
    }
    if !buf.ends_with(CRLF) {
        return Err(KvError::Protocol("expected CRLF line terminator".to_string()));
    }

    buf.truncate(buf.len() - CRLF.len());
    Ok(true)
}

fn parse_frame<R: BufRead>(reader: &mut R, line: &[u8], depth: usize) -> Result<Value> {
    let (&prefix, rest) = line
        .split_first()
        .ok_or_else(|| KvError::Protocol("empty frame header".to_string()))?;

    match prefix {
        b'+' => Ok(Value::SimpleString(String::from_utf8_lossy(rest).into_owned())),
        b'-' => Ok(Value::Error(String::from_utf8_lossy(rest).into_owned())),
        b':' => parse_integer(rest).map(Value::Integer),
        b'$' => {
            let len = parse_integer(rest)?;
            read_bulk(reader, len)
        }
        b'*' => {
            let count = parse_integer(rest)?;
            read_array(reader, count, depth)
        }
        other => Err(KvError::Protocol(format!(
            "unknown type prefix '{}'",
            other.escape_ascii()
        ))),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<Value> {
    if len == -1 {
        return Ok(Value::Null);
    }
    let len = usize::try_from(len)
        .map_err(|_| KvError::Protocol(format!("invalid bulk length {}", len)))?;
    if len > MAX_BULK_LEN {
        return Err(KvError::Protocol(format!(
            "bulk string too large: {} bytes (max {})",
            len, MAX_BULK_LEN
        )));
    }

    // Grow with the data actually received, not the declared length
    let mut data = Vec::with_capacity(len.min(MAX_LINE_LEN));
    let received = reader.by_ref().take(len as u64).read_to_end(&mut data)?;
    if received < len {
        return Err(KvError::Incomplete);
    }

    let mut terminator = [0u8; 2];
    read_exact(reader, &mut terminator)?;
    if terminator != CRLF {
        return Err(KvError::Protocol(
            "bulk string not terminated by CRLF".to_string(),
        ));
    }

    Ok(Value::Bulk(Bytes::from(data)))
}

fn read_array<R: BufRead>(reader: &mut R, count: i64, depth: usize) -> Result<Value> {
    // Null array; callers treat it as an absent request
    if count == -1 {
        return Ok(Value::Null);
    }
    let count = usize::try_from(count)
        .map_err(|_| KvError::Protocol(format!("invalid array length {}", count)))?;
    if count > MAX_ARRAY_LEN {
        return Err(KvError::Protocol(format!(
            "array too large: {} elements (max {})",
            count, MAX_ARRAY_LEN
        )));
    }
    if depth >= MAX_DEPTH {
        return Err(KvError::Protocol("arrays nested too deeply".to_string()));
    }

    let mut items = Vec::with_capacity(count.min(1024));
    let mut line = Vec::new();
    for _ in 0..count {
        if !read_line(reader, &mut line)? {
            return Err(KvError::Incomplete);
        }
        items.push(parse_frame(reader, &line, depth + 1)?);
    }
    Ok(Value::Array(items))
}

fn parse_integer(digits: &[u8]) -> Result<i64> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            KvError::Protocol(format!(
                "invalid integer '{}'",
                digits.escape_ascii()
            ))
        })
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => KvError::Incomplete,
        _ => KvError::Io(e),
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    writer.write_all(&encode(value))?;
    writer.flush()?;
    Ok(())
}
