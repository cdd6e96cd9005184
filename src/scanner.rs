//! Class-level annotation queries.
//!
//! A query walks the class's `RuntimeVisibleAnnotations` attribute entry by
//! entry, comparing each type descriptor to the target and skipping the
//! element values of every entry that does not match. Work is proportional to
//! the annotations present, not to the size of the class.
//!
//! The class-file version is never consulted. The walker assumes the constant
//! pool, member tables and attribute framing keep the layout they have had since
//! Java 1.5; a future format that changes those regions would be misread rather
//! than rejected.

use crate::bytes::{read_u16, read_u32};
use crate::constant_pool::{ConstantPool, POOL_COUNT_OFFSET};
use crate::element_value::skip_element_value_pairs;
use crate::error::{Error, Result, malformed};
use crate::navigator::{RUNTIME_VISIBLE_ANNOTATIONS, find_class_attribute};

pub const MAGIC: u32 = 0xCAFE_BABE;

/// Magic, minor and major version, constant_pool_count.
pub const MIN_HEADER_LEN: usize = POOL_COUNT_OFFSET + 2;

/// Something that names an annotation type by its dot-separated
/// fully-qualified name, e.g. `web.annotation.Controller`.
pub trait AnnotationType {
    fn qualified_name(&self) -> &str;
}

impl AnnotationType for str {
    fn qualified_name(&self) -> &str {
        self
    }
}

impl AnnotationType for String {
    fn qualified_name(&self) -> &str {
        self
    }
}

impl<T: AnnotationType + ?Sized> AnnotationType for &T {
    fn qualified_name(&self) -> &str {
        (**self).qualified_name()
    }
}

/// `web.annotation.Controller` -> `Lweb/annotation/Controller;`.
///
/// Segments are trimmed and empty segments dropped.
pub fn descriptor_for(qualified_name: &str) -> String {
    let internal = qualified_name
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("L{internal};")
}

/// One class file, with its constant pool indexed.
#[derive(Debug)]
pub struct ClassFile<'a> {
    pool: ConstantPool<'a>,
}

impl<'a> ClassFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_HEADER_LEN {
            return Err(malformed!(
                "{} bytes is shorter than the {MIN_HEADER_LEN}-byte class header",
                bytes.len()
            ));
        }
        let magic = read_u32(bytes, 0)?;
        if magic != MAGIC {
            return Err(malformed!("bad magic 0x{magic:08x}"));
        }

        Ok(Self {
            pool: ConstantPool::parse(bytes)?,
        })
    }

    /// Binary name of the class itself, dot-separated (`a.b.Outer$Inner`).
    pub fn class_name(&mut self) -> Result<String> {
        let mut scratch = self.pool.new_scratch();
        let this_class = read_u16(self.pool.bytes(), self.pool.header_offset() + 2)?;
        Ok(self.pool.class_name(this_class, &mut scratch)?.replace('/', "."))
    }

    /// Visits the type descriptor of each class annotation in attribute order,
    /// stopping as soon as `visit` returns `true`. Entries after that point are
    /// never decoded. Returns whether the walk stopped early.
    fn walk_annotations(&mut self, mut visit: impl FnMut(&str) -> bool) -> Result<bool> {
        let mut scratch = self.pool.new_scratch();
        let Some(attribute) =
            find_class_attribute(&mut self.pool, RUNTIME_VISIBLE_ANNOTATIONS, &mut scratch)?
        else {
            log::trace!("no {RUNTIME_VISIBLE_ANNOTATIONS} attribute");
            return Ok(false);
        };

        let bytes = self.pool.bytes();
        let count = read_u16(bytes, attribute.start)?;
        let mut offset = attribute.start + 2;
        for _ in 0..count {
            // The type index itself must lie inside the attribute.
            if offset + 2 > attribute.end {
                return Err(overrun(attribute.end));
            }
            if visit(self.pool.utf8_at(offset, &mut scratch)?) {
                return Ok(true);
            }
            offset = skip_element_value_pairs(bytes, offset + 2, 0)?;
            if offset > attribute.end {
                return Err(overrun(attribute.end));
            }
        }
        Ok(false)
    }

    /// Whether the class itself carries a runtime-visible `target` annotation.
    pub fn contains_annotation<T: AnnotationType + ?Sized>(&mut self, target: &T) -> Result<bool> {
        let descriptor = descriptor_for(target.qualified_name());
        let found = self.walk_annotations(|candidate| candidate == descriptor)?;
        log::trace!("{descriptor}: {found}");
        Ok(found)
    }

    /// Descriptors of every runtime-visible class annotation, in attribute order.
    pub fn annotation_types(&mut self) -> Result<Vec<String>> {
        let mut types = Vec::new();
        self.walk_annotations(|candidate| {
            types.push(candidate.to_string());
            false
        })?;
        Ok(types)
    }
}

fn overrun(end: usize) -> Error {
    malformed!("annotation entries overrun their attribute (ends at {end})")
}

/// Whether the class in `bytes` carries a runtime-visible `target` annotation.
pub fn contains_annotation<T: AnnotationType + ?Sized>(bytes: &[u8], target: &T) -> Result<bool> {
    ClassFile::parse(bytes)?.contains_annotation(target)
}
