use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::TestCase;
use crate::config::{CommandSpec, HarnessConfig};
use crate::process::{self, CancelToken, Invocation, Termination};

/// What happened when the compiler driver was run on one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    Succeeded,
    /// The driver ran and exited non-zero, timed out, or was cancelled.
    Failed(String),
    /// The driver could not be started.
    SpawnFailed(String),
}

/// Captured compiler diagnostics plus the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub status: CompileStatus,
    /// stdout followed by stderr.
    pub diagnostics: String,
    pub exit_code: Option<i32>,
}

impl CompileResult {
    pub fn succeeded(&self) -> bool {
        self.status == CompileStatus::Succeeded
    }
}

/// Invokes the external compiler driver.
#[derive(Debug, Clone)]
pub struct CompileRunner {
    command: CommandSpec,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CompileRunner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            command: config.compiler.clone(),
            working_dir: config.working_dir.clone(),
            timeout: config.timeout,
        }
    }

    /// Compiles one case. Never fails: every problem lands in the result.
    pub fn compile(&self, case: &TestCase, cancel: &CancelToken) -> CompileResult {
        let input = case.input.to_string_lossy();
        let output = case.artifact.to_string_lossy();
        let args = self.command.render_args(&[
            ("input", &*input),
            ("output", &*output),
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
            Ok(out) => {
                let diagnostics = join_streams(&out.stdout, &out.stderr);
                let status = match out.termination {
                    Termination::Exited(status) if status.success() => CompileStatus::Succeeded,
                    other => CompileStatus::Failed(format!("compiler {}", other.describe())),
                };
                CompileResult {
                    status,
                    diagnostics,
                    exit_code: out.termination.exit_code(),
                }
            }
            Err(err) => {
                tracing::warn!(case = %case.id(), error = %err, "could not start compiler");
                CompileResult {
                    status: CompileStatus::SpawnFailed(format!(
                        "failed to start compiler '{}': {}",
                        self.command.program, err
                    )),
                    diagnostics: String::new(),
                    exit_code: None,
                }
            }
        }
    }
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) if stdout.ends_with('\n') => format!("{}{}", stdout, stderr),
        (false, false) => format!("{}\n{}", stdout, stderr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_streams_keeps_order_and_separates_lines() {
        assert_eq!(join_streams("a\n", "b\n"), "a\nb\n");
        assert_eq!(join_streams("a", "b"), "a\nb");
        assert_eq!(join_streams("", "b"), "b");
        assert_eq!(join_streams("a", ""), "a");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_recorded_not_raised() {
        let config = HarnessConfig {
            compiler: CommandSpec::new("sh", &["-c", "echo 'syntax error' 1>&2; exit 1"]),
            ..HarnessConfig::default()
        };
        let case = TestCase {
            stage: "parser".into(),
            name: "bad".into(),
            input: "bad.yapl".into(),
            artifact: "out/parser/bad".into(),
            expected: None,
        };
        let result = CompileRunner::new(&config).compile(&case, &CancelToken::new());
        assert!(!result.succeeded());
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(result.diagnostics, "syntax error\n");
    }
}
