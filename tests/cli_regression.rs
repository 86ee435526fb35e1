// Regression tests for the stagecheck binary: exit codes and rendered output.
// Requires: assert_cmd, predicates crates in [dev-dependencies]
#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::Fixture;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn stagecheck() -> Command {
    Command::cargo_bin("stagecheck").unwrap()
}

#[test]
fn passing_suite_exits_zero() {
    let fixture = Fixture::new();
    fixture.write("parser", "a.src", "ok\n");
    fixture.write("codegen", "sum.src", "15\n");
    fixture.write("codegen", "sum.true", "15\n");
    let config = fixture.write_config_file(&[("parser", false), ("codegen", true)]);

    stagecheck()
        .arg("--config")
        .arg(&config)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(
            contains("[TESTING] parser/a")
                .and(contains("[RUN TEST RESULT] TRUE"))
                .and(contains("Test summary: total 2, passed 2, failed 0, skipped 0")),
        );
}

#[test]
fn mismatch_exits_one() {
    let fixture = Fixture::new();
    fixture.write("codegen", "sum.src", "15\n");
    fixture.write("codegen", "sum.true", "16\n");
    let config = fixture.write_config_file(&[("codegen", true)]);

    stagecheck()
        .arg("--config")
        .arg(&config)
        .arg("--no-color")
        .assert()
        .code(1)
        .stdout(contains("[RUN TEST RESULT] FALSE").and(contains("  - codegen/sum")));
}

#[test]
fn unknown_stage_is_a_config_error() {
    let fixture = Fixture::new();
    let config = fixture.write_config_file(&[("parser", false)]);

    stagecheck()
        .arg("--config")
        .arg(&config)
        .args(["--stage", "linker"])
        .assert()
        .code(2)
        .stderr(contains("unknown stage 'linker'"));
}

#[test]
fn missing_config_file_is_reported_with_diagnostics() {
    stagecheck()
        .args(["--config", "/nonexistent/stagecheck.yaml"])
        .assert()
        .code(2)
        .stderr(contains("stagecheck::config").or(contains("help:")));
}

#[test]
fn stage_flag_limits_the_run() {
    let fixture = Fixture::new();
    fixture.write("parser", "a.src", "ok\n");
    fixture.write("codegen", "sum.src", "15\n");
    fixture.write("codegen", "sum.true", "16\n");
    let config = fixture.write_config_file(&[("parser", false), ("codegen", true)]);

    stagecheck()
        .arg("--config")
        .arg(&config)
        .args(["--stage", "parser", "--no-color"])
        .assert()
        .success()
        .stdout(contains("parser/a").and(contains("codegen/sum").not()));
}
