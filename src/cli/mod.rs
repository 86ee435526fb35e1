//! The stagecheck command-line interface.
//!
//! Loads the configuration, applies flag overrides, runs the suite, and
//! maps the result to a process exit code.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use crate::cli::args::StagecheckArgs;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunOptions};
use crate::report::ConsoleSink;

pub mod args;

/// Exit code when at least one case failed or a stage could not be run.
pub const EXIT_FAILURES: u8 = 1;
/// Exit code for configuration errors.
pub const EXIT_CONFIG: u8 = 2;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = StagecheckArgs::parse();
    init_tracing(args.verbose);

    match run_with_args(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURES),
        Err(err) => {
            let code = if err.is_config() { EXIT_CONFIG } else { EXIT_FAILURES };
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Runs the suite described by `args`; `Ok(true)` means everything passed.
pub fn run_with_args(args: StagecheckArgs) -> Result<bool> {
    let config = build_config(&args)?;
    let options = RunOptions {
        filter: args.filter.clone(),
        verbose: args.verbose,
    };
    let orchestrator = Orchestrator::new(config, options)?;

    let mut sink = if args.no_color {
        ConsoleSink::new(false)
    } else {
        ConsoleSink::detect()
    };
    let report = orchestrator.run(&mut sink);
    Ok(report.success())
}

/// Loads the configuration file and applies flag overrides.
pub fn build_config(args: &StagecheckArgs) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::discover(args.config.as_deref())?;
    if let Some(root) = &args.testfiles_root {
        config.testfiles_root = root.clone();
    }
    if let Some(root) = &args.output_root {
        config.output_root = root.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config.select_stages(&args.stages)?;
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "stagecheck=debug" } else { "stagecheck=warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .try_init();
}
