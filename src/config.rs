//! Harness configuration: the stage table, filesystem layout, and the
//! commands used to reach the external compiler and runtime.
//!
//! Configuration is a YAML document whose keys are all optional. Anything
//! missing falls back to the layout of the YAPL compiler test suite:
//!
//! ```yaml
//! testfiles_root: testfiles
//! output_root: output
//! source_extension: yapl
//! expected_extension: "true"
//! timeout_secs: 60
//! compiler:
//!   program: ./scripts/run.sh
//!   args: ["{input}", "{output}"]
//! runtime:
//!   program: java
//!   args: ["-cp", "{artifact}", "{entry}"]
//! stages:
//!   - name: parser
//!   - name: codegen
//!     executable: true
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HarnessError, Result};

/// Config file looked up in the current directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "stagecheck.yaml";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// STAGES
// =============================================================================

/// One phase of the compiler pipeline under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    /// Zero-based position in the pipeline.
    pub position: usize,
    /// Cases of an executable stage are run and compared after compiling.
    pub executable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct StageEntry {
    name: String,
    #[serde(default)]
    executable: bool,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// An external program plus its argument template.
///
/// Arguments may contain `{placeholder}` markers which are substituted per
/// case; see [`CommandSpec::render_args`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitutes every `{key}` in the argument template.
    pub fn render_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{}}}", key), value)
                })
            })
            .collect()
    }

    fn default_compiler() -> Self {
        Self::new("./scripts/run.sh", &["{input}", "{output}"])
    }

    fn default_runtime() -> Self {
        Self::new("java", &["-cp", "{artifact}", "{entry}"])
    }
}

// =============================================================================
// HARNESS CONFIG
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    testfiles_root: Option<PathBuf>,
    output_root: Option<PathBuf>,
    source_extension: Option<String>,
    expected_extension: Option<String>,
    working_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    compiler: Option<CommandSpec>,
    runtime: Option<CommandSpec>,
    stages: Option<Vec<StageEntry>>,
}

/// Fully resolved configuration for one harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub testfiles_root: PathBuf,
    pub output_root: PathBuf,
    pub source_extension: String,
    pub expected_extension: String,
    /// Directory both external programs are started in. Relative roots
    /// are resolved against it.
    pub working_dir: PathBuf,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub compiler: CommandSpec,
    pub runtime: CommandSpec,
    pub stages: Vec<Stage>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let stages = [
            ("parser", false),
            ("symbolcheck", false),
            ("typecheck", false),
            ("codegen", true),
        ]
        .iter()
        .enumerate()
        .map(|(position, (name, executable))| Stage {
            name: name.to_string(),
            position,
            executable: *executable,
        })
        .collect();

        Self {
            testfiles_root: PathBuf::from("testfiles"),
            output_root: PathBuf::from("output"),
            source_extension: "yapl".to_string(),
            expected_extension: "true".to_string(),
            working_dir: PathBuf::from("."),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            compiler: CommandSpec::default_compiler(),
            runtime: CommandSpec::default_runtime(),
            stages,
        }
    }
}

impl HarnessConfig {
    /// Parses a YAML document, filling gaps with the defaults.
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| HarnessError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?
        };
        Self::from_raw(raw)
    }

    /// Reads the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Loads an explicit config file, or [`DEFAULT_CONFIG_FILE`] if present,
    /// or the built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let defaults = Self::default();
        let stages = match raw.stages {
            Some(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(position, entry)| Stage {
                    name: entry.name,
                    position,
                    executable: entry.executable,
                })
                .collect(),
            None => defaults.stages,
        };

        let config = Self {
            testfiles_root: raw.testfiles_root.unwrap_or(defaults.testfiles_root),
            output_root: raw.output_root.unwrap_or(defaults.output_root),
            source_extension: raw.source_extension.unwrap_or(defaults.source_extension),
            expected_extension: raw.expected_extension.unwrap_or(defaults.expected_extension),
            working_dir: raw.working_dir.unwrap_or(defaults.working_dir),
            timeout: match raw.timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.timeout,
            },
            compiler: raw.compiler.unwrap_or(defaults.compiler),
            runtime: raw.runtime.unwrap_or(defaults.runtime),
            stages,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(HarnessError::config("stage name must not be empty", None));
            }
            if stage.name.contains(['/', '\\']) {
                return Err(HarnessError::config(
                    format!("stage name '{}' must be a single directory name", stage.name),
                    None,
                ));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(HarnessError::config(
                    format!("stage '{}' is declared more than once", stage.name),
                    Some("stage names map to directories and must be unique"),
                ));
            }
        }
        if self.source_extension.is_empty() {
            return Err(HarnessError::config("source_extension must not be empty", None));
        }
        if self.source_extension == self.expected_extension {
            return Err(HarnessError::config(
                "source_extension and expected_extension must differ",
                None,
            ));
        }
        if self.compiler.program.trim().is_empty() || self.runtime.program.trim().is_empty() {
            return Err(HarnessError::config(
                "compiler and runtime programs must be set",
                None,
            ));
        }
        Ok(())
    }

    /// Makes `working_dir` absolute so paths handed to children resolve the
    /// same way they do for the harness.
    pub fn absolutize(&mut self) -> Result<()> {
        if self.working_dir.is_relative() {
            let cwd = std::env::current_dir().map_err(|source| HarnessError::Io {
                path: self.working_dir.clone(),
                source,
            })?;
            self.working_dir = cwd.join(&self.working_dir);
        }
        Ok(())
    }

    /// Keeps only the named stages, preserving declared order.
    pub fn select_stages(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            if !self.stages.iter().any(|s| &s.name == name) {
                let known: Vec<_> = self.stages.iter().map(|s| s.name.as_str()).collect();
                return Err(HarnessError::config(
                    format!("unknown stage '{}'", name),
                    Some(format!("configured stages: {}", known.join(", ")).as_str()),
                ));
            }
        }
        self.stages.retain(|s| names.contains(&s.name));
        Ok(())
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<HarnessConfig> {
        HarnessConfig::from_yaml_str(yaml, Path::new("test.yaml"))
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse("").unwrap();
        let names: Vec<_> = config.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["parser", "symbolcheck", "typecheck", "codegen"]);
        assert!(config.stage("codegen").unwrap().executable);
        assert!(!config.stage("parser").unwrap().executable);
        assert_eq!(config.source_extension, "yapl");
        assert_eq!(config.expected_extension, "true");
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn stage_table_keeps_declared_order() {
        let config = parse(
            "stages:\n  - name: lex\n  - name: run\n    executable: true\n  - name: check\n",
        )
        .unwrap();
        let stages: Vec<_> = config
            .stages
            .iter()
            .map(|s| (s.name.as_str(), s.position, s.executable))
            .collect();
        assert_eq!(stages, [("lex", 0, false), ("run", 1, true), ("check", 2, false)]);
    }

    #[test]
    fn zero_timeout_disables_the_bound() {
        let config = parse("timeout_secs: 0\n").unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn duplicate_stage_is_rejected() {
        let err = parse("stages:\n  - name: parser\n  - name: parser\n").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("stagez: []\n").unwrap_err();
        assert!(matches!(err, HarnessError::ConfigParse { .. }));
    }

    #[test]
    fn select_stages_filters_and_rejects_unknown() {
        let mut config = HarnessConfig::default();
        config
            .select_stages(&["codegen".to_string(), "parser".to_string()])
            .unwrap();
        let names: Vec<_> = config.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["parser", "codegen"]);

        let err = config.select_stages(&["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown stage 'nope'"));
    }

    #[test]
    fn render_args_substitutes_placeholders() {
        let spec = CommandSpec::new("java", &["-cp", "{artifact}", "{entry}", "--{missing}"]);
        let args = spec.render_args(&[("artifact", "out/codegen/sum"), ("entry", "Sum")]);
        assert_eq!(args, ["-cp", "out/codegen/sum", "Sum", "--{missing}"]);
    }
}
