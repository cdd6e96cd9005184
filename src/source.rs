use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::scanner::{AnnotationType, ClassFile};

/// Classes found in one jar.
#[derive(Debug, Default, Clone)]
pub struct JarScan {
    pub examined: usize,
    pub malformed: usize,
    pub matches: Vec<String>,
}

pub fn read_class_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read class file: {}", path.display()))
}

/// `org/example/A$B.class` -> `org.example.A$B`.
///
/// Module and package descriptors are not classes and yield `None`; entries under
/// `META-INF/versions/<n>/` lose that prefix.
pub fn class_entry_name(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(".class")?;
    let stem = strip_versioned_prefix(stem).unwrap_or(stem);
    let simple = stem.rsplit(['/', '\\']).next().unwrap_or(stem);
    if simple.is_empty() || is_descriptor_class(simple) {
        return None;
    }
    Some(stem.replace(['/', '\\'], "."))
}

fn strip_versioned_prefix(stem: &str) -> Option<&str> {
    let rest = stem.strip_prefix("META-INF/versions/")?;
    let (version, class_path) = rest.split_once('/')?;
    version.parse::<u32>().ok()?;
    Some(class_path)
}

/// `module-info` and `package-info` carry module or package metadata, not a class.
pub fn is_descriptor_class(simple_name: &str) -> bool {
    matches!(simple_name, "module-info" | "package-info")
}

pub fn is_nested_class(class_name: &str) -> bool {
    class_name.contains('$')
}

/// Runs the annotation query on a class held in memory, logging and absorbing
/// malformed input. `None` means the class could not be walked.
pub fn probe_class<T: AnnotationType + ?Sized>(
    bytes: &[u8],
    target: &T,
    origin: &str,
) -> Option<bool> {
    match ClassFile::parse(bytes).and_then(|mut class| class.contains_annotation(target)) {
        Ok(found) => {
            log::debug!("{origin}: {found}");
            Some(found)
        }
        Err(e) => {
            log::warn!("skipping {origin}: {e}");
            None
        }
    }
}

pub fn scan_jar<T: AnnotationType + ?Sized>(
    jar_path: &Path,
    target: &T,
    include_nested: bool,
) -> Result<JarScan> {
    let file = File::open(jar_path)
        .with_context(|| format!("Failed to open jar: {}", jar_path.display()))?;
    // SAFETY: the file is opened read-only and outlives the mapping.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", jar_path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip structure: {}", jar_path.display()))?;

    let mut scan = JarScan::default();
    let mut buf = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(class_name) = class_entry_name(entry.name()) else {
            continue;
        };

        buf.clear();
        entry.read_to_end(&mut buf).with_context(|| {
            format!("Failed to inflate {} in {}", entry.name(), jar_path.display())
        })?;

        scan.examined += 1;
        let origin = format!("{}!{}", jar_path.display(), entry.name());
        match probe_class(&buf, target, &origin) {
            Some(true) if include_nested || !is_nested_class(&class_name) => {
                scan.matches.push(class_name);
            }
            Some(_) => {}
            None => scan.malformed += 1,
        }
    }

    scan.matches.sort();
    scan.matches.dedup();
    Ok(scan)
}
