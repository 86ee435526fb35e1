//! Defines the command-line arguments for the stagecheck CLI.
//!
//! This module uses the `clap` crate with its "derive" feature. Every flag
//! overrides a value from the configuration file; nothing here is required.

use clap::Parser;
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "stagecheck",
    version,
    about = "Runs a compiler's stage-by-stage test suite and compares program output against golden files."
)]
pub struct StagecheckArgs {
    /// Configuration file (defaults to ./stagecheck.yaml when present).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run only this stage; may be repeated.
    #[arg(short, long = "stage", value_name = "NAME")]
    pub stages: Vec<String>,

    /// Run only cases whose `<stage>/<name>` contains this text.
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Directory holding one sub-directory of inputs per stage.
    #[arg(long, value_name = "DIR")]
    pub testfiles_root: Option<PathBuf>,

    /// Directory the compiler writes artifacts into.
    #[arg(long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Seconds before a compiler or runtime process is killed; 0 waits forever.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Print mismatch diffs and debug logs.
    #[arg(short, long)]
    pub verbose: bool,
}
