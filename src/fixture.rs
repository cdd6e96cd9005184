//! Test-only class-file builder.
//!
//! Produces minimal but structurally valid class files: a constant pool, the
//! class header, interfaces, fields, methods and class attributes. Shared by the
//! unit tests and the integration tests, so it only depends on `std`.

#![allow(dead_code)]

use std::collections::HashMap;

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

#[derive(Debug, Clone)]
pub enum ElementValue {
    /// A primitive backed by a CONSTANT_Integer: one of `B C I S Z`.
    Primitive(u8, i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Class(String),
    Enum(String, String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
    /// Tag followed by a raw u2, for exercising unknown tags.
    Raw(u8, u16),
}

impl ElementValue {
    pub fn int(value: i32) -> Self {
        Self::Primitive(b'I', value)
    }

    pub fn boolean(value: bool) -> Self {
        Self::Primitive(b'Z', i32::from(value))
    }

    pub fn string(value: &str) -> Self {
        Self::Str(value.to_string())
    }

    pub fn enumeration(type_descriptor: &str, constant: &str) -> Self {
        Self::Enum(type_descriptor.to_string(), constant.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub descriptor: String,
    pub pairs: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// `descriptor` is the internal form, e.g. `Lweb/annotation/Controller;`.
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            pairs: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: ElementValue) -> Self {
        self.pairs.push((name.to_string(), value));
        self
    }
}

#[derive(Debug, Clone)]
struct Member {
    access: u16,
    name: u16,
    descriptor: u16,
    attributes: Vec<(u16, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8_cache: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<(u16, Vec<u8>)>,
}

pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

impl ClassFileBuilder {
    /// Starts a class named `internal_name` (slash form) with no superclass.
    pub fn new(internal_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_index: 1,
            utf8_cache: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(internal_name);
        builder
    }

    fn push_entry(&mut self, tag: u8, payload: &[u8], slots: u16) -> u16 {
        let index = self.next_index;
        self.pool.push(tag);
        self.pool.extend_from_slice(payload);
        self.next_index += slots;
        index
    }

    pub fn this_class(&self) -> u16 {
        self.this_class
    }

    /// Offset right after the constant pool.
    pub fn header_offset(&self) -> usize {
        10 + self.pool.len()
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8_cache.get(value) {
            return index;
        }
        let encoded = encode_modified_utf8(value);
        let mut payload = (encoded.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(&encoded);
        let index = self.push_entry(1, &payload, 1);
        self.utf8_cache.insert(value.to_string(), index);
        index
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.push_entry(3, &value.to_be_bytes(), 1)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        self.push_entry(4, &value.to_bits().to_be_bytes(), 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.push_entry(5, &value.to_be_bytes(), 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        self.push_entry(6, &value.to_bits().to_be_bytes(), 2)
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.push_entry(7, &name.to_be_bytes(), 1)
    }

    pub fn string(&mut self, utf8_index: u16) -> u16 {
        self.push_entry(8, &utf8_index.to_be_bytes(), 1)
    }

    fn two_refs(&mut self, tag: u8, a: u16, b: u16) -> u16 {
        let mut payload = a.to_be_bytes().to_vec();
        payload.extend_from_slice(&b.to_be_bytes());
        self.push_entry(tag, &payload, 1)
    }

    pub fn field_ref(&mut self, class: u16, name_and_type: u16) -> u16 {
        self.two_refs(9, class, name_and_type)
    }

    pub fn method_ref(&mut self, class: u16, name_and_type: u16) -> u16 {
        self.two_refs(10, class, name_and_type)
    }

    pub fn interface_method_ref(&mut self, class: u16, name_and_type: u16) -> u16 {
        self.two_refs(11, class, name_and_type)
    }

    pub fn name_and_type(&mut self, name: u16, descriptor: u16) -> u16 {
        self.two_refs(12, name, descriptor)
    }

    pub fn method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        let mut payload = vec![kind];
        payload.extend_from_slice(&reference.to_be_bytes());
        self.push_entry(15, &payload, 1)
    }

    pub fn method_type(&mut self, descriptor: u16) -> u16 {
        self.push_entry(16, &descriptor.to_be_bytes(), 1)
    }

    pub fn dynamic(&mut self, bootstrap: u16, name_and_type: u16) -> u16 {
        self.two_refs(17, bootstrap, name_and_type)
    }

    pub fn invoke_dynamic(&mut self, bootstrap: u16, name_and_type: u16) -> u16 {
        self.two_refs(18, bootstrap, name_and_type)
    }

    pub fn super_class(&mut self, internal_name: &str) -> &mut Self {
        self.super_class = self.class(internal_name);
        self
    }

    pub fn interface(&mut self, internal_name: &str) -> &mut Self {
        let index = self.class(internal_name);
        self.interfaces.push(index);
        self
    }

    fn member(&mut self, name: &str, descriptor: &str, attributes: Vec<(&str, Vec<u8>)>) -> Member {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let attributes = attributes
            .into_iter()
            .map(|(attr_name, payload)| (self.utf8(attr_name), payload))
            .collect();
        Member {
            access: 0x0001,
            name,
            descriptor,
            attributes,
        }
    }

    pub fn field(
        &mut self,
        name: &str,
        descriptor: &str,
        attributes: Vec<(&str, Vec<u8>)>,
    ) -> &mut Self {
        let member = self.member(name, descriptor, attributes);
        self.fields.push(member);
        self
    }

    pub fn method(
        &mut self,
        name: &str,
        descriptor: &str,
        attributes: Vec<(&str, Vec<u8>)>,
    ) -> &mut Self {
        let member = self.member(name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    /// Adds a class-level attribute with an opaque payload.
    pub fn attribute(&mut self, name: &str, payload: Vec<u8>) -> &mut Self {
        let name = self.utf8(name);
        self.attributes.push((name, payload));
        self
    }

    /// Adds a class-level `RuntimeVisibleAnnotations` attribute.
    pub fn annotations(&mut self, annotations: &[Annotation]) -> &mut Self {
        let payload = self.annotations_payload(annotations);
        self.attribute(RUNTIME_VISIBLE_ANNOTATIONS, payload)
    }

    /// Encodes an annotations attribute body: u2 count then each annotation.
    pub fn annotations_payload(&mut self, annotations: &[Annotation]) -> Vec<u8> {
        let mut out = (annotations.len() as u16).to_be_bytes().to_vec();
        for annotation in annotations {
            self.encode_annotation(annotation, &mut out);
        }
        out
    }

    fn encode_annotation(&mut self, annotation: &Annotation, out: &mut Vec<u8>) {
        let type_index = self.utf8(&annotation.descriptor);
        out.extend_from_slice(&type_index.to_be_bytes());
        out.extend_from_slice(&(annotation.pairs.len() as u16).to_be_bytes());
        for (name, value) in &annotation.pairs {
            let name_index = self.utf8(name);
            out.extend_from_slice(&name_index.to_be_bytes());
            self.encode_value(value, out);
        }
    }

    fn encode_value(&mut self, value: &ElementValue, out: &mut Vec<u8>) {
        match value {
            ElementValue::Primitive(tag, v) => {
                let index = self.integer(*v);
                out.push(*tag);
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Long(v) => {
                let index = self.long(*v);
                out.push(b'J');
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Float(v) => {
                let index = self.float(*v);
                out.push(b'F');
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Double(v) => {
                let index = self.double(*v);
                out.push(b'D');
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Str(s) => {
                let index = self.utf8(s);
                out.push(b's');
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Class(descriptor) => {
                let index = self.utf8(descriptor);
                out.push(b'c');
                out.extend_from_slice(&index.to_be_bytes());
            }
            ElementValue::Enum(type_descriptor, constant) => {
                let type_index = self.utf8(type_descriptor);
                let const_index = self.utf8(constant);
                out.push(b'e');
                out.extend_from_slice(&type_index.to_be_bytes());
                out.extend_from_slice(&const_index.to_be_bytes());
            }
            ElementValue::Annotation(nested) => {
                out.push(b'@');
                self.encode_annotation(nested, out);
            }
            ElementValue::Array(values) => {
                out.push(b'[');
                out.extend_from_slice(&(values.len() as u16).to_be_bytes());
                for v in values {
                    self.encode_value(v, out);
                }
            }
            ElementValue::Raw(tag, raw) => {
                out.push(*tag);
                out.extend_from_slice(&raw.to_be_bytes());
            }
        }
    }

    fn write_attributes(out: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) {
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for (name, payload) in attributes {
            out.extend_from_slice(&name.to_be_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
    }

    fn write_members(out: &mut Vec<u8>, members: &[Member]) {
        out.extend_from_slice(&(members.len() as u16).to_be_bytes());
        for member in members {
            out.extend_from_slice(&member.access.to_be_bytes());
            out.extend_from_slice(&member.name.to_be_bytes());
            out.extend_from_slice(&member.descriptor.to_be_bytes());
            Self::write_attributes(out, &member.attributes);
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.pool);

        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }

        Self::write_members(&mut out, &self.fields);
        Self::write_members(&mut out, &self.methods);
        Self::write_attributes(&mut out, &self.attributes);
        out
    }
}
