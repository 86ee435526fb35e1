//! Per-case verdicts, run totals, and the sinks they are written to.
//!
//! The orchestrator never prints directly. Every line goes through a
//! [`ReportSink`], so the console runner colors output with `termcolor`
//! while tests capture it in a [`BufferSink`].

use std::io::Write;

use difference::Difference;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::catalog::TestCase;
use crate::compare::Outcome;
use crate::compile::{CompileResult, CompileStatus};
use crate::execute::ExecutionResult;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Final judgement for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Compile-only stage, compiler succeeded.
    Compiled,
    /// Compile-only stage, compiler failed.
    CompileFailed,
    /// Executable stage, output compared against the golden file.
    Compared(Outcome),
    /// Executable stage whose golden file could not be read.
    MissingGolden(String),
    Skipped(String),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        match self {
            Verdict::Compiled => true,
            Verdict::Compared(outcome) => outcome.matched,
            _ => false,
        }
    }

    pub fn skipped(&self) -> bool {
        matches!(self, Verdict::Skipped(_))
    }

    pub fn failed(&self) -> bool {
        !self.passed() && !self.skipped()
    }
}

/// Everything recorded for one case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub case: TestCase,
    pub compile: Option<CompileResult>,
    pub execution: Option<ExecutionResult>,
    pub verdict: Verdict,
}

/// A stage whose cases could not be enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: String,
    pub error: String,
}

/// Aggregate of a whole run.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
    pub stage_failures: Vec<StageFailure>,
    pub cancelled: bool,
}

impl SuiteReport {
    /// (passed, failed, skipped)
    pub fn counts(&self) -> (usize, usize, usize) {
        let passed = self.cases.iter().filter(|r| r.verdict.passed()).count();
        let failed = self.cases.iter().filter(|r| r.verdict.failed()).count();
        let skipped = self.cases.iter().filter(|r| r.verdict.skipped()).count();
        (passed, failed, skipped)
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|r| r.verdict.failed())
    }

    /// True when every case passed or was skipped and every stage ran.
    pub fn success(&self) -> bool {
        !self.cancelled && self.stage_failures.is_empty() && self.failed_cases().next().is_none()
    }

    pub fn case(&self, id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|r| r.case.id() == id)
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Styling hint attached to each emitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Pass,
    Fail,
    Skip,
    Detail,
}

/// Destination for report lines.
pub trait ReportSink {
    fn emit(&mut self, tone: Tone, text: &str);
}

/// Collects report lines into a string for tests or programmatic capture.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub buffer: String,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl ReportSink for BufferSink {
    fn emit(&mut self, _tone: Tone, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
}

/// Writes report lines to stdout, colored when enabled.
pub struct ConsoleSink {
    stdout: StandardStream,
}

impl ConsoleSink {
    pub fn new(use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    /// Colors follow whether stdout is a terminal.
    pub fn detect() -> Self {
        Self::new(atty::is(atty::Stream::Stdout))
    }
}

impl ReportSink for ConsoleSink {
    fn emit(&mut self, tone: Tone, text: &str) {
        let mut spec = ColorSpec::new();
        match tone {
            Tone::Plain => {}
            Tone::Heading => {
                spec.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Tone::Pass => {
                spec.set_fg(Some(Color::Green)).set_bold(true);
            }
            Tone::Fail => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
            Tone::Skip => {
                spec.set_fg(Some(Color::Yellow));
            }
            Tone::Detail => {
                spec.set_dimmed(true);
            }
        }
        let _ = self.stdout.set_color(&spec);
        let _ = writeln!(self.stdout, "{}", text);
        let _ = self.stdout.reset();
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

/// Formats run events onto a sink.
pub struct Reporter<'a> {
    sink: &'a mut dyn ReportSink,
    verbose: bool,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a mut dyn ReportSink, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    pub fn stage_started(&mut self, stage: &str, cases: usize) {
        self.sink
            .emit(Tone::Heading, &format!("=== stage {} ({} cases) ===", stage, cases));
    }

    pub fn stage_failed(&mut self, failure: &StageFailure) {
        self.sink.emit(
            Tone::Fail,
            &format!("[STAGE ERROR] {}: {}", failure.stage, failure.error),
        );
    }

    pub fn case_started(&mut self, case: &TestCase) {
        self.sink.emit(Tone::Plain, &format!("[TESTING] {}", case.id()));
    }

    pub fn compiled(&mut self, result: &CompileResult) {
        if !result.diagnostics.is_empty() {
            for line in result.diagnostics.lines() {
                self.sink.emit(Tone::Detail, line);
            }
        }
        match &result.status {
            CompileStatus::Succeeded => self.sink.emit(Tone::Pass, "[COMPILE] OK"),
            CompileStatus::Failed(reason) | CompileStatus::SpawnFailed(reason) => self
                .sink
                .emit(Tone::Fail, &format!("[COMPILE] FAILED ({})", reason)),
        }
    }

    /// Emits the single verdict line for a finished case.
    pub fn verdict(&mut self, report: &CaseReport) {
        match &report.verdict {
            // the compile line already carries the verdict
            Verdict::Compiled | Verdict::CompileFailed => {}
            Verdict::Compared(outcome) => {
                let tone = if outcome.matched { Tone::Pass } else { Tone::Fail };
                self.sink
                    .emit(tone, &format!("[RUN TEST RESULT] {}", outcome.verdict()));
                if !outcome.matched {
                    self.mismatch(outcome);
                }
            }
            Verdict::MissingGolden(error) => self.sink.emit(
                Tone::Fail,
                &format!("[RUN TEST RESULT] FALSE (golden file unreadable: {})", error),
            ),
            Verdict::Skipped(reason) => self
                .sink
                .emit(Tone::Skip, &format!("[SKIPPED] {} ({})", report.case.id(), reason)),
        }
    }

    fn mismatch(&mut self, outcome: &Outcome) {
        self.sink
            .emit(Tone::Detail, &format!("  Expected: {:?}", outcome.expected));
        self.sink
            .emit(Tone::Detail, &format!("  Actual:   {:?}", outcome.actual));
        if !self.verbose {
            return;
        }
        self.sink.emit(Tone::Detail, "  Diff:");
        for diff in outcome.diff() {
            match diff {
                Difference::Same(ref x) => {
                    for line in x.lines() {
                        self.sink.emit(Tone::Detail, &format!("    {}", line));
                    }
                }
                Difference::Rem(ref x) => {
                    for line in x.lines() {
                        self.sink.emit(Tone::Pass, &format!("  - expected: {}", line));
                    }
                }
                Difference::Add(ref x) => {
                    for line in x.lines() {
                        self.sink.emit(Tone::Fail, &format!("  + actual:   {}", line));
                    }
                }
            }
        }
    }

    pub fn cancelled(&mut self) {
        self.sink
            .emit(Tone::Fail, "Run cancelled; remaining cases were not started.");
    }

    pub fn summary(&mut self, report: &SuiteReport) {
        let (passed, failed, skipped) = report.counts();
        self.sink.emit(Tone::Plain, "");
        self.sink.emit(
            Tone::Heading,
            &format!(
                "Test summary: total {}, passed {}, failed {}, skipped {}",
                report.cases.len(),
                passed,
                failed,
                skipped
            ),
        );

        if failed > 0 {
            self.sink.emit(Tone::Fail, "Failed tests:");
            for r in report.failed_cases() {
                self.sink.emit(Tone::Fail, &format!("  - {}", r.case.id()));
            }
        }
        if !report.stage_failures.is_empty() {
            self.sink.emit(Tone::Fail, "Stages not run:");
            for f in &report.stage_failures {
                self.sink.emit(Tone::Fail, &format!("  - {}: {}", f.stage, f.error));
            }
        }
    }
}
