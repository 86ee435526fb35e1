//! Shared fixtures for stagecheck integration tests.
//!
//! A [`Fixture`] is a temporary project with a `testfiles/` tree and two
//! shell scripts standing in for the real toolchain:
//!
//! - `compiler.sh <input> <output>` copies the input to
//!   `<output>/program.txt`. Inputs containing `FAIL` make it exit 1, and
//!   inputs containing `NOARTIFACT` make it succeed without writing anything.
//! - `runtime.sh <artifact> <entry>` prints `program.txt`, replacing
//!   `@ENTRY@` with the entry name. Content containing `CRASH` exits 3.
//!   `HANG` replaces the script with a long `sleep`, while `STALL` runs the
//!   `sleep` as a child of the script so the pipes outlive the script.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stagecheck::{CommandSpec, HarnessConfig, Stage};
use tempfile::TempDir;

const COMPILER: &str = r#"#!/bin/sh
input="$1"
output="$2"
echo "compiling $input"
if grep -q FAIL "$input"; then
  echo "error: intentional failure in $input" 1>&2
  exit 1
fi
if grep -q NOARTIFACT "$input"; then
  exit 0
fi
mkdir -p "$output"
cp "$input" "$output/program.txt"
"#;

const RUNTIME: &str = r#"#!/bin/sh
artifact="$1"
entry="$2"
if [ ! -f "$artifact/program.txt" ]; then
  echo "Error: could not find or load main class $entry" 1>&2
  exit 1
fi
if grep -q CRASH "$artifact/program.txt"; then
  echo "Exception in thread \"main\"" 1>&2
  exit 3
fi
if grep -q HANG "$artifact/program.txt"; then
  exec sleep 30
fi
if grep -q STALL "$artifact/program.txt"; then
  sleep 30
  echo "woke up"
fi
sed "s/@ENTRY@/$entry/" "$artifact/program.txt"
"#;

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("compiler.sh"), COMPILER).unwrap();
        fs::write(dir.path().join("runtime.sh"), RUNTIME).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Creates an empty stage directory.
    pub fn stage_dir(&self, stage: &str) -> PathBuf {
        let dir = self.root().join("testfiles").join(stage);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `testfiles/<stage>/<file>`.
    pub fn write(&self, stage: &str, file: &str, content: &str) -> PathBuf {
        let path = self.stage_dir(stage).join(file);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn artifact(&self, stage: &str, name: &str) -> PathBuf {
        self.root().join("output").join(stage).join(name)
    }

    /// Config wired to the fake toolchain with the given stage table.
    pub fn config(&self, stages: &[(&str, bool)]) -> HarnessConfig {
        HarnessConfig {
            testfiles_root: PathBuf::from("testfiles"),
            output_root: PathBuf::from("output"),
            source_extension: "src".to_string(),
            expected_extension: "true".to_string(),
            working_dir: self.root().to_path_buf(),
            timeout: Some(Duration::from_secs(10)),
            compiler: CommandSpec::new("sh", &["compiler.sh", "{input}", "{output}"]),
            runtime: CommandSpec::new("sh", &["runtime.sh", "{artifact}", "{entry}"]),
            stages: stages
                .iter()
                .enumerate()
                .map(|(position, (name, executable))| Stage {
                    name: name.to_string(),
                    position,
                    executable: *executable,
                })
                .collect(),
        }
    }

    /// Same wiring as [`Fixture::config`], as a YAML file for the CLI.
    pub fn write_config_file(&self, stages: &[(&str, bool)]) -> PathBuf {
        let mut yaml = String::from(
            "testfiles_root: testfiles\n\
             output_root: output\n\
             source_extension: src\n\
             expected_extension: \"true\"\n\
             timeout_secs: 10\n\
             compiler:\n  program: sh\n  args: [\"compiler.sh\", \"{input}\", \"{output}\"]\n\
             runtime:\n  program: sh\n  args: [\"runtime.sh\", \"{artifact}\", \"{entry}\"]\n\
             stages:\n",
        );
        for (name, executable) in stages {
            yaml.push_str(&format!("  - name: {}\n    executable: {}\n", name, executable));
        }
        yaml.push_str(&format!("working_dir: {}\n", self.root().display()));
        let path = self.root().join("stagecheck.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }
}
