use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "annotation-finder")]
#[command(about = "Find compiled Java classes carrying a runtime-visible annotation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log per-class decisions to stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan class directories and jars for classes carrying ANNOTATION.
    Scan {
        /// Fully-qualified annotation name, e.g. web.annotation.Controller.
        annotation: String,

        /// Directories, jars or class files. Defaults to $ANNOTATION_FINDER_PATH,
        /// then the local Maven repository.
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Also report nested (`Outer$Inner`) classes.
        #[arg(long)]
        include_nested: bool,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print whether one class file carries ANNOTATION.
    Check {
        class_file: PathBuf,
        annotation: String,
    },
    /// List the runtime-visible annotations of one class file.
    List { class_file: PathBuf },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
