//! Skipping annotation element values without interpreting them.
//!
//! ```text
//! annotation          := type_index:u2 element_value_pairs
//! element_value_pairs := count:u2 { name_index:u2 element_value }*
//! element_value       := tag:u1 value
//! ```
//!
//! The tag alone determines how many bytes `value` spans, recursively for
//! nested annotations and arrays.

use crate::bytes::{read_u8, read_u16, slice};
use crate::error::{Result, malformed};

/// Deepest annotation/array nesting the skipper follows before giving up.
pub const MAX_NESTING: usize = 256;

/// Binary shape of an element value, selected by its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementValueShape {
    /// `B C D F I J S Z s c`: a single u2 constant-pool index.
    Const,
    /// `e`: type-name index and constant-name index.
    EnumConst,
    /// `@`: a nested annotation.
    Annotation,
    /// `[`: u2 count followed by that many element values.
    Array,
}

impl ElementValueShape {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
                Some(Self::Const)
            }
            b'e' => Some(Self::EnumConst),
            b'@' => Some(Self::Annotation),
            b'[' => Some(Self::Array),
            _ => None,
        }
    }
}

/// Primitive tags; an array whose first element carries one is fixed-width.
pub fn is_primitive(tag: u8) -> bool {
    matches!(tag, b'B' | b'Z' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D')
}

fn check_depth(depth: usize, offset: usize) -> Result<()> {
    if depth > MAX_NESTING {
        return Err(malformed!(
            "annotation values nested deeper than {MAX_NESTING} at offset {offset}"
        ));
    }
    Ok(())
}

/// Skips an `element_value_pairs` list starting at its u2 count; returns the
/// offset just past it.
pub fn skip_element_value_pairs(bytes: &[u8], offset: usize, depth: usize) -> Result<usize> {
    check_depth(depth, offset)?;
    let count = read_u16(bytes, offset)?;
    let mut offset = offset + 2;
    for _ in 0..count {
        // name_index
        offset = skip_element_value(bytes, offset + 2, depth)?;
    }
    Ok(offset)
}

/// Skips one `element_value` starting at its tag; returns the offset just past it.
pub fn skip_element_value(bytes: &[u8], offset: usize, depth: usize) -> Result<usize> {
    check_depth(depth, offset)?;
    let tag = read_u8(bytes, offset)?;
    let shape = ElementValueShape::from_tag(tag).ok_or_else(|| {
        malformed!("unknown element value tag 0x{tag:02x} at offset {offset}")
    })?;
    let value = offset + 1;

    let end = match shape {
        ElementValueShape::Const => value + 2,
        ElementValueShape::EnumConst => value + 4,
        ElementValueShape::Annotation => skip_element_value_pairs(bytes, value + 2, depth + 1)?,
        ElementValueShape::Array => skip_array(bytes, value, depth + 1)?,
    };

    slice(bytes, offset, end - offset)?;
    Ok(end)
}

fn skip_array(bytes: &[u8], offset: usize, depth: usize) -> Result<usize> {
    let count = usize::from(read_u16(bytes, offset)?);
    if count == 0 {
        // Same framing as an empty pairs list: just the zero count.
        return skip_element_value_pairs(bytes, offset, depth);
    }

    let first = offset + 2;
    if is_primitive(read_u8(bytes, first)?) {
        // Every element is tag + u2.
        return Ok(first + 3 * count);
    }

    let mut offset = first;
    for _ in 0..count {
        offset = skip_element_value(bytes, offset, depth)?;
    }
    Ok(offset)
}
