//! Walking from the class header to the class's own attribute table.
//!
//! Interfaces, fields and methods are stepped over without decoding: only their
//! counts and the attribute lengths are read.

use std::ops::Range;

use crate::bytes::{read_i32, read_u16, slice};
use crate::constant_pool::ConstantPool;
use crate::error::{Result, malformed};

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

/// access_flags, this_class, super_class.
const CLASS_HEADER_LEN: usize = 6;
/// access_flags, name_index, descriptor_index (attributes_count follows).
const MEMBER_HEADER_LEN: usize = 6;
/// attribute_name_index, attribute_length.
const ATTRIBUTE_HEADER_LEN: usize = 6;

/// Payload range of the attribute whose header starts at `offset`.
fn attribute_payload(bytes: &[u8], offset: usize) -> Result<Range<usize>> {
    let raw_length = read_i32(bytes, offset + 2)?;
    let length = usize::try_from(raw_length)
        .map_err(|_| malformed!("negative attribute length {raw_length} at offset {offset}"))?;
    let start = offset + ATTRIBUTE_HEADER_LEN;
    slice(bytes, start, length)?;
    Ok(start..start + length)
}

/// Skips an attribute table starting at its u2 count.
fn skip_attributes(bytes: &[u8], offset: usize) -> Result<usize> {
    let count = read_u16(bytes, offset)?;
    let mut offset = offset + 2;
    for _ in 0..count {
        offset = attribute_payload(bytes, offset)?.end;
    }
    Ok(offset)
}

/// Skips a field or method table starting at its u2 count.
fn skip_members(bytes: &[u8], offset: usize) -> Result<usize> {
    let count = read_u16(bytes, offset)?;
    let mut offset = offset + 2;
    for _ in 0..count {
        offset = skip_attributes(bytes, offset + MEMBER_HEADER_LEN)?;
    }
    Ok(offset)
}

/// Offset of the class's `attributes_count`.
pub fn class_attributes_offset(pool: &ConstantPool<'_>) -> Result<usize> {
    let bytes = pool.bytes();
    let mut offset = pool.header_offset() + CLASS_HEADER_LEN;

    let interfaces = usize::from(read_u16(bytes, offset)?);
    offset += 2;
    slice(bytes, offset, interfaces * 2)?;
    offset += interfaces * 2;

    let fields_end = skip_members(bytes, offset)?;
    skip_members(bytes, fields_end)
}

/// Payload range of the first class attribute called `name`, if any.
pub fn find_class_attribute(
    pool: &mut ConstantPool<'_>,
    name: &str,
    scratch: &mut [u16],
) -> Result<Option<Range<usize>>> {
    let bytes = pool.bytes();
    let mut offset = class_attributes_offset(pool)?;
    let count = read_u16(bytes, offset)?;
    offset += 2;

    for _ in 0..count {
        let payload = attribute_payload(bytes, offset)?;
        if pool.utf8_at(offset, scratch)? == name {
            return Ok(Some(payload));
        }
        offset = payload.end;
    }

    Ok(None)
}
