//! Fixed-width big-endian reads and the modified UTF-8 decoder.
//!
//! Every read is bounds-checked against the caller's buffer. An offset that
//! falls outside the buffer is reported as [`Error::Malformed`](crate::Error)
//! rather than truncated.

use crate::error::{Result, malformed};

/// Returns `bytes[offset..offset + length]`, or an error if any part lies
/// outside the buffer.
pub fn slice(bytes: &[u8], offset: usize, length: usize) -> Result<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            malformed!(
                "{length} bytes at offset {offset} exceed buffer of {} bytes",
                bytes.len()
            )
        })
}

pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8> {
    Ok(slice(bytes, offset, 1)?[0])
}

pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    let b = slice(bytes, offset, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let b = slice(bytes, offset, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    let b = slice(bytes, offset, 4)?;
    Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Expecting a leading byte.
    Lead,
    /// One continuation byte left to complete the pending unit.
    LastContinuation,
    /// Two continuation bytes left (second byte of a three-byte sequence).
    MiddleContinuation,
}

/// Decodes `length` bytes of modified UTF-8 starting at `offset` into UTF-16
/// code units written to `scratch`, returning how many units were produced.
///
/// The decoder is permissive: bytes in continuation position are never checked
/// for the `10xxxxxx` pattern, and any leading byte outside `0x00..=0x7F` and
/// `0xC0..=0xDF` starts a three-byte sequence. Garbage in yields best-effort
/// code units out, never an error. A sequence cut short by the end of the run
/// is dropped.
///
/// `scratch` must hold at least `length` units; the decoded length never
/// exceeds the encoded byte length.
pub fn decode_modified_utf8(
    bytes: &[u8],
    offset: usize,
    length: usize,
    scratch: &mut [u16],
) -> Result<usize> {
    let encoded = slice(bytes, offset, length)?;
    if scratch.len() < length {
        return Err(malformed!(
            "scratch buffer of {} units cannot hold a {length}-byte string",
            scratch.len()
        ));
    }

    let mut produced = 0usize;
    let mut state = DecodeState::Lead;
    let mut pending: u16 = 0;

    for &byte in encoded {
        let c = u16::from(byte);
        match state {
            DecodeState::Lead => {
                if c < 0x80 {
                    scratch[produced] = c;
                    produced += 1;
                } else if (0xC0..0xE0).contains(&c) {
                    pending = c & 0x1F;
                    state = DecodeState::LastContinuation;
                } else {
                    pending = c & 0x0F;
                    state = DecodeState::MiddleContinuation;
                }
            }
            DecodeState::LastContinuation => {
                scratch[produced] = (pending << 6) | (c & 0x3F);
                produced += 1;
                state = DecodeState::Lead;
            }
            DecodeState::MiddleContinuation => {
                pending = (pending << 6) | (c & 0x3F);
                state = DecodeState::LastContinuation;
            }
        }
    }

    Ok(produced)
}
