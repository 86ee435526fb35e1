// Stagecheck runner: discovers per-stage test inputs, compiles and runs them,
// and compares program output against golden files.
// Usage: stagecheck [--config FILE] [--stage NAME]... [--filter TEXT]

use std::process::ExitCode;

fn main() -> ExitCode {
    stagecheck::cli::run()
}
