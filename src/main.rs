use anyhow::{Context, Result};
use annotation_finder::ClassFile;
use annotation_finder::cli::{Cli, Commands, OutputFormat};
use annotation_finder::config::{resolve_scan_roots, write_output};
use annotation_finder::scan::{ScanOptions, ScanReport, collect_inputs, scan_paths};
use annotation_finder::source::read_class_file;
use clap::Parser;
use serde::Serialize;
use std::path::Path;

fn main() -> Result<()> {
    let cli = parse_cli()?;
    init_logging(cli.verbose);

    match cli.command.clone() {
        Commands::Scan {
            annotation,
            paths,
            format,
            include_nested,
            output,
        } => {
            let annotation = normalize_annotation_name(&annotation);
            let roots = resolve_scan_roots(&paths)?;
            let inputs = collect_inputs(&roots)?;
            log::debug!("{} inputs under {} roots", inputs.len(), roots.len());
            let report = scan_paths(&inputs, &annotation, ScanOptions { include_nested });
            write_scan_output(&report, format, output.as_deref())?;
        }
        Commands::Check {
            class_file,
            annotation,
        } => {
            let annotation = normalize_annotation_name(&annotation);
            let found = check_class(&class_file, &annotation)?;
            println!("{found}");
        }
        Commands::List { class_file } => {
            let listing = list_class(&class_file)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_module("annotation_finder", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_scan(args)))
}

fn rewrite_args_for_implicit_scan(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["scan", "check", "list", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "scan".to_string());
        }
    }

    args
}

/// Accepts `@web.annotation.Controller`, `web/annotation/Controller` and the
/// plain dotted form.
fn normalize_annotation_name(raw: &str) -> String {
    let s = raw.trim().trim_start_matches('@');
    let s = match s.strip_prefix('L').and_then(|rest| rest.strip_suffix(';')) {
        Some(inner) => inner,
        None => s,
    };
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '/' { '.' } else { c })
        .collect()
}

fn check_class(class_file: &Path, annotation: &str) -> Result<bool> {
    let bytes = read_class_file(class_file)?;
    annotation_finder::contains_annotation(&bytes, annotation)
        .with_context(|| format!("Failed to scan {}", class_file.display()))
}

#[derive(Debug, Serialize)]
struct ClassListing {
    class_name: String,
    annotations: Vec<String>,
}

fn list_class(class_file: &Path) -> Result<ClassListing> {
    let bytes = read_class_file(class_file)?;
    let mut class = ClassFile::parse(&bytes)
        .with_context(|| format!("Failed to parse {}", class_file.display()))?;
    Ok(ClassListing {
        class_name: class.class_name()?,
        annotations: class.annotation_types()?,
    })
}

fn write_scan_output(
    report: &ScanReport,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("annotation: {}\n", report.annotation));
            out.push_str(&format!("classes_examined: {}\n", report.classes_examined));
            out.push_str(&format!("malformed_classes: {}\n", report.malformed_classes));
            out.push_str(&format!("duration_ms: {}\n", report.duration_ms));
            for m in &report.matches {
                out.push_str(&format!("- {} ({})\n", m.class_name, m.origin));
            }
            out
        }
    };

    write_output(&content, output)
}
