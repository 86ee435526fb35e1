//! Drives every configured stage through discovery, compilation and,
//! for executable stages, execution and comparison.
//!
//! The run is strictly sequential: stages in declared order, cases in
//! discovery order, and within a case compile, then execute, then compare.
//! Per-case failures are recorded and the run moves on; a stage whose
//! directory cannot be listed is reported and skipped. Only cancellation
//! stops the run early.

use std::fs;

use crate::catalog::{TestCase, TestCatalog};
use crate::compare;
use crate::compile::CompileRunner;
use crate::config::{HarnessConfig, Stage};
use crate::error::Result;
use crate::execute::ExecuteRunner;
use crate::process::CancelToken;
use crate::report::{CaseReport, ReportSink, Reporter, StageFailure, SuiteReport, Verdict};

/// Options that shape a run without changing the configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Case-insensitive substring matched against `<stage>/<name>`.
    pub filter: Option<String>,
    /// Print mismatch diffs.
    pub verbose: bool,
}

/// Sequences stages and cases.
pub struct Orchestrator {
    stages: Vec<Stage>,
    catalog: TestCatalog,
    compiler: CompileRunner,
    runtime: ExecuteRunner,
    options: RunOptions,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(mut config: HarnessConfig, options: RunOptions) -> Result<Self> {
        config.validate()?;
        config.absolutize()?;
        Ok(Self {
            catalog: TestCatalog::new(&config),
            compiler: CompileRunner::new(&config),
            runtime: ExecuteRunner::new(&config),
            stages: config.stages,
            options: RunOptions {
                filter: options.filter.map(|f| f.to_lowercase()),
                ..options
            },
            cancel: CancelToken::new(),
        })
    }

    /// Token that stops the run and kills any in-flight subprocess.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs every stage, writing verdicts to `sink`.
    pub fn run(&self, sink: &mut dyn ReportSink) -> SuiteReport {
        let mut reporter = Reporter::new(sink, self.options.verbose);
        let mut suite = SuiteReport::default();

        for stage in &self.stages {
            if self.cancel.is_cancelled() {
                break;
            }
            let cases = match self.catalog.discover(stage) {
                Ok(cases) => cases,
                Err(err) => {
                    tracing::error!(stage = %stage.name, error = %err, "stage discovery failed");
                    let failure = StageFailure {
                        stage: stage.name.clone(),
                        error: describe_error(&err),
                    };
                    reporter.stage_failed(&failure);
                    suite.stage_failures.push(failure);
                    continue;
                }
            };

            reporter.stage_started(&stage.name, cases.len());
            for case in cases {
                if self.cancel.is_cancelled() {
                    break;
                }
                let report = self.run_case(stage, case, &mut reporter);
                suite.cases.push(report);
            }
        }

        if self.cancel.is_cancelled() {
            suite.cancelled = true;
            reporter.cancelled();
        }
        reporter.summary(&suite);
        suite
    }

    fn run_case(&self, stage: &Stage, case: TestCase, reporter: &mut Reporter<'_>) -> CaseReport {
        if let Some(reason) = self.skip_reason(&case) {
            let report = CaseReport {
                case,
                compile: None,
                execution: None,
                verdict: Verdict::Skipped(reason),
            };
            reporter.verdict(&report);
            return report;
        }

        reporter.case_started(&case);
        let compile = self.compiler.compile(&case, &self.cancel);
        reporter.compiled(&compile);

        let report = if stage.executable {
            let execution = self.runtime.execute(&case, &self.cancel);
            let verdict = match read_golden(&case) {
                Ok(expected) => {
                    let mut outcome = compare::compare(&execution.actual_text(), &expected);
                    // a failed run never matches, whatever the golden file holds
                    outcome.matched &= !execution.is_failure();
                    Verdict::Compared(outcome)
                }
                Err(err) => Verdict::MissingGolden(err),
            };
            CaseReport {
                case,
                compile: Some(compile),
                execution: Some(execution),
                verdict,
            }
        } else {
            let verdict = if compile.succeeded() {
                Verdict::Compiled
            } else {
                Verdict::CompileFailed
            };
            CaseReport {
                case,
                compile: Some(compile),
                execution: None,
                verdict,
            }
        };

        reporter.verdict(&report);
        report
    }

    fn skip_reason(&self, case: &TestCase) -> Option<String> {
        let filter = self.options.filter.as_deref()?;
        if case.id().to_lowercase().contains(filter) {
            None
        } else {
            Some(format!("filtered out by substring: {}", filter))
        }
    }
}

fn read_golden(case: &TestCase) -> std::result::Result<String, String> {
    let path = case
        .expected
        .as_ref()
        .ok_or_else(|| "no golden file path for this case".to_string())?;
    fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Flattens an error and its sources into one line.
fn describe_error(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // walkdir already folds the io error into its own message
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
