//! Stage-by-stage test harness for an external compiler toolchain.
//!
//! Test inputs live in `<testfiles-root>/<stage>/<name>.<ext>`. Each case is
//! compiled by an external driver; cases of executable stages are then run
//! by an external runtime and their stdout compared against a golden file.

pub mod catalog;
pub mod cli;
pub mod compare;
pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod orchestrator;
pub mod process;
pub mod report;

pub use crate::catalog::{TestCase, TestCatalog};
pub use crate::compare::{compare, Outcome};
pub use crate::compile::{CompileResult, CompileRunner, CompileStatus};
pub use crate::config::{CommandSpec, HarnessConfig, Stage};
pub use crate::error::HarnessError;
pub use crate::execute::{ExecuteRunner, ExecutionResult};
pub use crate::orchestrator::{Orchestrator, RunOptions};
pub use crate::process::CancelToken;
pub use crate::report::{BufferSink, CaseReport, ConsoleSink, ReportSink, SuiteReport, Verdict};
