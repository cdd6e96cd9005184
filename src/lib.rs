//! # annotation-finder
//!
//! Answers "does this compiled Java class carry annotation X?" directly from the
//! class-file bytes, without building a class model.
//!
//! ## Architecture
//!
//! - **bytes**: bounds-checked big-endian reads and the modified UTF-8 decoder
//! - **constant_pool**: one-pass index of constant-pool payload offsets with a lazy Utf8 cache
//! - **navigator**: steps over interfaces, fields and methods to the class attribute table
//! - **element_value**: shape-driven skipping of annotation element values
//! - **scanner**: the annotation query itself ([`contains_annotation`], [`ClassFile`])
//! - **source**: class bytes from files and jar entries
//! - **scan**: parallel classpath scanning over directories and jars
//! - **cli** / **config**: command-line surface and default resolution
//!
//! ```
//! # fn demo(bytes: &[u8]) -> annotation_finder::Result<()> {
//! if annotation_finder::contains_annotation(bytes, "web.annotation.Controller")? {
//!     println!("controller");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The constant-pool index and the structure walker are internal; callers only
//! ever see the query results, never byte offsets.
//!
//! ```compile_fail
//! use annotation_finder::constant_pool::ConstantPool;
//! ```
//!
//! ```compile_fail
//! let bytes: &[u8] = &[];
//! let class = annotation_finder::ClassFile::parse(bytes).unwrap();
//! let _ = class.constant_pool();
//! ```

mod bytes;
pub mod cli;
pub mod config;
mod constant_pool;
mod element_value;
pub mod error;
mod navigator;
pub mod scan;
pub mod scanner;
pub mod source;

#[cfg(test)]
mod fixture;

pub use error::{Error, Result};
pub use scanner::{AnnotationType, ClassFile, contains_annotation, descriptor_for};
