//! Constant-pool index.
//!
//! The pool is walked once to record where each entry's payload starts. Nothing
//! else is decoded up front: Utf8 entries are decoded on first use and cached for
//! the lifetime of the index.

use crate::bytes::{decode_modified_utf8, read_u8, read_u16};
use crate::error::{Result, malformed};

/// Offset of the `constant_pool_count` field: magic (4) + minor (2) + major (2).
pub const POOL_COUNT_OFFSET: usize = 8;

/// Constant-pool entry tags.
pub mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// Size in bytes of an entry (tag included), and whether it occupies two slots.
fn entry_size(bytes: &[u8], offset: usize, entry_tag: u8) -> Result<(usize, bool)> {
    Ok(match entry_tag {
        tag::FIELD_REF
        | tag::METHOD_REF
        | tag::INTERFACE_METHOD_REF
        | tag::INTEGER
        | tag::FLOAT
        | tag::NAME_AND_TYPE
        | tag::DYNAMIC
        | tag::INVOKE_DYNAMIC => (5, false),
        tag::LONG | tag::DOUBLE => (9, true),
        tag::UTF8 => (3 + usize::from(read_u16(bytes, offset + 1)?), false),
        tag::METHOD_HANDLE => (4, false),
        tag::CLASS | tag::STRING | tag::METHOD_TYPE | tag::MODULE | tag::PACKAGE => (3, false),
        // Unknown tags keep the common index-only shape.
        _ => (3, false),
    })
}

/// Payload offsets of every constant-pool slot, plus the lazily filled Utf8 cache.
#[derive(Debug)]
pub struct ConstantPool<'a> {
    bytes: &'a [u8],
    /// Payload offset (past the tag) per slot. Zero marks slot 0 and the unused
    /// upper half of a Long/Double.
    offsets: Vec<usize>,
    strings: Vec<Option<String>>,
    max_utf8_len: usize,
    header_offset: usize,
}

impl<'a> ConstantPool<'a> {
    /// Indexes the constant pool of `bytes`, which must start with a class-file
    /// header.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let count = usize::from(read_u16(bytes, POOL_COUNT_OFFSET)?);
        if count == 0 {
            return Err(malformed!("constant_pool_count is zero"));
        }

        let mut offsets = vec![0usize; count];
        let mut max_utf8_len = 0usize;
        let mut offset = POOL_COUNT_OFFSET + 2;
        let mut index = 1usize;

        while index < count {
            let entry_tag = read_u8(bytes, offset).map_err(|_| {
                malformed!(
                    "constant_pool_count {count} overruns the {}-byte buffer at entry {index}",
                    bytes.len()
                )
            })?;
            offsets[index] = offset + 1;

            let (size, wide) = entry_size(bytes, offset, entry_tag)?;
            if entry_tag == tag::UTF8 {
                max_utf8_len = max_utf8_len.max(size - 3);
            }

            offset += size;
            if offset > bytes.len() {
                return Err(malformed!(
                    "constant pool entry {index} (tag {entry_tag}) ends at {offset}, past {} bytes",
                    bytes.len()
                ));
            }

            index += if wide { 2 } else { 1 };
        }

        log::trace!(
            "indexed {count} constant pool slots; header at {offset}, longest utf8 {max_utf8_len}"
        );

        Ok(Self {
            bytes,
            offsets,
            strings: vec![None; count],
            max_utf8_len,
            header_offset: offset,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Offset of the access flags that follow the last pool entry.
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    /// Longest encoded Utf8 entry, in bytes.
    pub fn max_utf8_len(&self) -> usize {
        self.max_utf8_len
    }

    /// A decode buffer large enough for any Utf8 entry of this pool.
    pub fn new_scratch(&self) -> Vec<u16> {
        vec![0u16; self.max_utf8_len()]
    }

    /// Tag byte of slot `index`.
    pub fn tag(&self, index: u16) -> Result<u8> {
        let offset = self.payload_offset(index)?;
        read_u8(self.bytes, offset - 1)
    }

    fn payload_offset(&self, index: u16) -> Result<usize> {
        match self.offsets.get(usize::from(index)) {
            Some(&offset) if offset != 0 => Ok(offset),
            Some(_) => Err(malformed!("constant pool index {index} refers to an unusable slot")),
            None => Err(malformed!(
                "constant pool index {index} out of range (count {})",
                self.offsets.len()
            )),
        }
    }

    /// Decodes the Utf8 entry at `index`, caching the result.
    pub fn utf8(&mut self, index: u16, scratch: &mut [u16]) -> Result<&str> {
        let entry_tag = self.tag(index)?;
        if entry_tag != tag::UTF8 {
            return Err(malformed!(
                "constant pool index {index} has tag {entry_tag}, expected Utf8"
            ));
        }

        let slot = usize::from(index);
        if self.strings[slot].is_none() {
            let offset = self.payload_offset(index)?;
            let length = usize::from(read_u16(self.bytes, offset)?);
            let produced = decode_modified_utf8(self.bytes, offset + 2, length, scratch)?;
            self.strings[slot] = Some(String::from_utf16_lossy(&scratch[..produced]));
        }
        Ok(self.strings[slot].as_deref().unwrap_or_default())
    }

    /// Internal name held by the Class entry at `index`.
    pub fn class_name(&mut self, index: u16, scratch: &mut [u16]) -> Result<&str> {
        let entry_tag = self.tag(index)?;
        if entry_tag != tag::CLASS {
            return Err(malformed!(
                "constant pool index {index} has tag {entry_tag}, expected Class"
            ));
        }
        let name_index = read_u16(self.bytes, self.payload_offset(index)?)?;
        self.utf8(name_index, scratch)
    }

    /// Reads a u2 constant-pool index at `offset` and decodes the Utf8 entry it names.
    pub fn utf8_at(&mut self, offset: usize, scratch: &mut [u16]) -> Result<&str> {
        let index = read_u16(self.bytes, offset)?;
        self.utf8(index, scratch)
    }
}
