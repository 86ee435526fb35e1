//! Harness-level failures.
//!
//! Only problems that stop a stage or the whole run are errors. A compiler
//! that exits non-zero or a runtime that crashes is recorded as data on the
//! case (see [`crate::compile::CompileResult`] and
//! [`crate::execute::ExecutionResult`]), never as a [`HarnessError`].

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Unified error type for configuration and discovery failures.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("Configuration error: {message}")]
    #[diagnostic(code(stagecheck::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read configuration file '{}'", path.display())]
    #[diagnostic(
        code(stagecheck::config),
        help("pass an existing file with --config, or omit it to use the built-in defaults")
    )]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{}'", path.display())]
    #[diagnostic(code(stagecheck::config))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot enumerate test cases for stage '{stage}' in '{}'", dir.display())]
    #[diagnostic(
        code(stagecheck::discovery),
        help("every configured stage needs a directory under the testfiles root")
    )]
    Discovery {
        stage: String,
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Stage '{stage}' input location '{}' is not a directory", dir.display())]
    #[diagnostic(
        code(stagecheck::discovery),
        help("replace the file with a directory holding the stage's test inputs")
    )]
    StageNotDirectory { stage: String, dir: PathBuf },

    #[error("I/O error on '{}'", path.display())]
    #[diagnostic(code(stagecheck::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Builds a configuration error with an optional hint.
    pub fn config(message: impl Into<String>, help: Option<&str>) -> Self {
        HarnessError::Config {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }

    /// Returns true for errors raised before any stage runs.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HarnessError::Config { .. }
                | HarnessError::ConfigRead { .. }
                | HarnessError::ConfigParse { .. }
        )
    }
}
