use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{HarnessConfig, Stage};
use crate::error::{HarnessError, Result};

/// A single test input within a stage, with every path derived up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub stage: String,
    /// File stem of the input, e.g. `sum`.
    pub name: String,
    pub input: PathBuf,
    /// Where the compiler is told to write the artifact.
    pub artifact: PathBuf,
    /// Golden output, present only for executable stages.
    pub expected: Option<PathBuf>,
}

impl TestCase {
    /// `<stage>/<name>`, the identifier used in reports and filters.
    pub fn id(&self) -> String {
        format!("{}/{}", self.stage, self.name)
    }

    /// Runtime entry point: the case name with its first character upper-cased.
    pub fn entry_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Enumerates test cases per stage from the testfiles tree.
#[derive(Debug, Clone)]
pub struct TestCatalog {
    testfiles_root: PathBuf,
    output_root: PathBuf,
    source_extension: String,
    expected_extension: String,
}

impl TestCatalog {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            testfiles_root: config.working_dir.join(&config.testfiles_root),
            output_root: config.working_dir.join(&config.output_root),
            source_extension: config.source_extension.clone(),
            expected_extension: config.expected_extension.clone(),
        }
    }

    pub fn stage_dir(&self, stage: &Stage) -> PathBuf {
        self.testfiles_root.join(&stage.name)
    }

    /// Lists the cases of `stage`, sorted by name.
    ///
    /// Only regular files directly inside the stage directory whose
    /// extension is the source extension count. A missing or unreadable
    /// directory fails the whole stage.
    pub fn discover(&self, stage: &Stage) -> Result<Vec<TestCase>> {
        let dir = self.stage_dir(stage);
        // walkdir lists a plain file root as an empty tree
        if dir.exists() && !dir.is_dir() {
            return Err(HarnessError::StageNotDirectory {
                stage: stage.name.clone(),
                dir,
            });
        }
        let mut names = Vec::new();

        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| HarnessError::Discovery {
                stage: stage.name.clone(),
                dir: dir.clone(),
                source,
            })?;
            // symlinked inputs count, directories never do
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = self.case_name(entry.path()) {
                names.push(name);
            }
        }

        names.sort();
        tracing::debug!(stage = %stage.name, count = names.len(), "discovered test cases");
        Ok(names
            .into_iter()
            .map(|name| self.case(stage, name))
            .collect())
    }

    fn case_name(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?;
        if ext != self.source_extension.as_str() {
            return None;
        }
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }

    fn case(&self, stage: &Stage, name: String) -> TestCase {
        let dir = self.stage_dir(stage);
        TestCase {
            stage: stage.name.clone(),
            input: dir.join(format!("{}.{}", name, self.source_extension)),
            artifact: self.output_root.join(&stage.name).join(&name),
            expected: stage
                .executable
                .then(|| dir.join(format!("{}.{}", name, self.expected_extension))),
            name,
        }
    }
}
