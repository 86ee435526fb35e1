use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::TestCase;
use crate::config::{CommandSpec, HarnessConfig};
use crate::process::{self, CancelToken, Invocation, Termination};

/// Output of running one compiled artifact.
///
/// A failed run still carries text: the error description stands in for
/// program output so the comparison yields a failing outcome instead of
/// aborting the suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Completed { stdout: String },
    /// `stdout` holds whatever the program printed before it failed.
    Failed {
        reason: String,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionResult {
    /// Text handed to the comparator.
    pub fn actual_text(&self) -> String {
        match self {
            ExecutionResult::Completed { stdout } => stdout.clone(),
            ExecutionResult::Failed {
                reason,
                stdout,
                stderr,
            } => {
                let mut text = format!("[runtime error] {}\n", reason);
                for stream in [stdout, stderr] {
                    text.push_str(stream);
                    if !stream.is_empty() && !stream.ends_with('\n') {
                        text.push('\n');
                    }
                }
                text
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failed { .. })
    }
}

/// Invokes the external artifact runtime.
#[derive(Debug, Clone)]
pub struct ExecuteRunner {
    command: CommandSpec,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ExecuteRunner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            command: config.runtime.clone(),
            working_dir: config.working_dir.clone(),
            timeout: config.timeout,
        }
    }

    /// Runs the artifact of `case`, regardless of how compilation went.
    pub fn execute(&self, case: &TestCase, cancel: &CancelToken) -> ExecutionResult {
        if !case.artifact.exists() {
            return ExecutionResult::Failed {
                reason: format!("artifact '{}' does not exist", case.artifact.display()),
                stdout: String::new(),
                stderr: String::new(),
            };
        }

        let artifact = case.artifact.to_string_lossy();
        let entry = case.entry_name();
        let args = self.command.render_args(&[
            ("artifact", &*artifact),
            ("entry", entry.as_str()),
            ("stage", case.stage.as_str()),
            ("name", case.name.as_str()),
        ]);
        let invocation = Invocation {
            program: &self.command.program,
            args: &args,
            working_dir: &self.working_dir,
            timeout: self.timeout,
        };

        match process::invoke(&invocation, cancel) {
            Ok(out) => match out.termination {
                Termination::Exited(status) if status.success() => {
                    ExecutionResult::Completed { stdout: out.stdout }
                }
                other => ExecutionResult::Failed {
                    reason: format!("runtime {}", other.describe()),
                    stdout: out.stdout,
                    stderr: out.stderr,
                },
            },
            Err(err) => ExecutionResult::Failed {
                reason: format!("failed to start runtime '{}': {}", self.command.program, err),
                stdout: String::new(),
                stderr: String::new(),
            },
        }
    }
}
