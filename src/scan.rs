use anyhow::Result;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use crate::scanner::{ClassFile, descriptor_for};
use crate::source::{is_descriptor_class, is_nested_class, read_class_file, scan_jar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Class,
    Jar,
}

pub fn input_kind(path: &Path) -> Option<InputKind> {
    match path.extension()?.to_str()? {
        "class" => Some(InputKind::Class),
        "jar" => Some(InputKind::Jar),
        _ => None,
    }
}

/// Collects `.class` and `.jar` files under each root. A root that is itself a
/// file is kept as-is.
pub fn collect_inputs(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for root in roots {
        if root.is_file() {
            inputs.push(root.clone());
            continue;
        }
        if !root.exists() {
            anyhow::bail!("Scan path does not exist: {}", root.display());
        }

        let (tx, rx) = mpsc::channel();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .build_parallel();

        walker.run(|| {
            let tx = tx.clone();
            Box::new(move |entry| {
                if let Ok(entry) = entry {
                    let path = entry.path();
                    if path.is_file() && input_kind(path).is_some() {
                        let _ = tx.send(path.to_path_buf());
                    }
                }
                ignore::WalkState::Continue
            })
        });

        drop(tx);
        inputs.extend(rx.iter());
    }

    inputs.sort();
    inputs.dedup();
    Ok(inputs)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Report `Outer$Inner` classes too.
    pub include_nested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ClassMatch {
    pub class_name: String,
    pub origin: String,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub annotation: String,
    pub descriptor: String,
    pub scanned_inputs: usize,
    pub failed_inputs: usize,
    pub classes_examined: usize,
    pub malformed_classes: usize,
    pub duration_ms: u64,
    pub matches: Vec<ClassMatch>,
}

#[derive(Debug, Default)]
struct InputScan {
    failed: bool,
    examined: usize,
    malformed: usize,
    matches: Vec<ClassMatch>,
}

/// A class file on disk counts as examined exactly when the same entry inside a
/// jar would: descriptor classes are skipped, nested classes are examined and
/// only filtered out of the matches.
fn scan_class_input(path: &Path, annotation: &str, options: ScanOptions) -> Result<InputScan> {
    if path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(is_descriptor_class)
    {
        return Ok(InputScan::default());
    }

    let bytes = read_class_file(path)?;
    let origin = path.to_string_lossy().to_string();
    let mut scan = InputScan {
        examined: 1,
        ..InputScan::default()
    };

    let outcome = ClassFile::parse(&bytes).and_then(|mut class| {
        if class.contains_annotation(annotation)? {
            class.class_name().map(Some)
        } else {
            Ok(None)
        }
    });
    match outcome {
        Ok(Some(class_name)) => {
            log::debug!("{origin}: {class_name} matches");
            if options.include_nested || !is_nested_class(&class_name) {
                scan.matches.push(ClassMatch { class_name, origin });
            }
        }
        Ok(None) => log::debug!("{origin}: no match"),
        Err(e) => {
            log::warn!("skipping {origin}: {e}");
            scan.malformed = 1;
        }
    }
    Ok(scan)
}

fn scan_jar_input(path: &Path, annotation: &str, options: ScanOptions) -> Result<InputScan> {
    let jar = scan_jar(path, annotation, options.include_nested)?;
    let origin = path.to_string_lossy().to_string();
    Ok(InputScan {
        failed: false,
        examined: jar.examined,
        malformed: jar.malformed,
        matches: jar
            .matches
            .into_iter()
            .map(|class_name| ClassMatch {
                class_name,
                origin: origin.clone(),
            })
            .collect(),
    })
}

/// Runs one independent query per class across `inputs` in parallel.
///
/// Unreadable inputs and malformed classes are logged and counted; they never
/// abort the scan.
pub fn scan_paths(inputs: &[PathBuf], annotation: &str, options: ScanOptions) -> ScanReport {
    let start = Instant::now();

    let per_input: Vec<InputScan> = inputs
        .par_iter()
        .map(|path| {
            let result = match input_kind(path) {
                Some(InputKind::Class) => scan_class_input(path, annotation, options),
                Some(InputKind::Jar) => scan_jar_input(path, annotation, options),
                None => Err(anyhow::anyhow!("Unsupported input: {}", path.display())),
            };
            result.unwrap_or_else(|e| {
                log::warn!("{e:#}");
                InputScan {
                    failed: true,
                    ..InputScan::default()
                }
            })
        })
        .collect();

    let mut report = ScanReport {
        annotation: annotation.to_string(),
        descriptor: descriptor_for(annotation),
        scanned_inputs: inputs.len(),
        failed_inputs: 0,
        classes_examined: 0,
        malformed_classes: 0,
        duration_ms: 0,
        matches: Vec::new(),
    };
    for scan in per_input {
        report.failed_inputs += usize::from(scan.failed);
        report.classes_examined += scan.examined;
        report.malformed_classes += scan.malformed;
        report.matches.extend(scan.matches);
    }
    report.matches.sort();
    report.duration_ms = start.elapsed().as_millis() as u64;

    log::info!(
        "{} of {} classes carry {} ({} malformed, {} inputs failed)",
        report.matches.len(),
        report.classes_examined,
        report.descriptor,
        report.malformed_classes,
        report.failed_inputs
    );
    report
}
