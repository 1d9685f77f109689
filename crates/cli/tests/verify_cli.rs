// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `iosnap test` preconditions
//!
//! Replays need Node.js, so these stop at the checks made before any replay.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{TestProject, MATH_JS};
use predicates::prelude::*;

#[test]
fn test_without_log_aborts() {
    let project = TestProject::new();
    project.file("src/math.js", MATH_JS);

    project
        .iosnap()
        .arg("test")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No snapshots to verify"))
        .stderr(predicate::str::contains("iosnap record"));
}

#[test]
fn test_with_empty_log_aborts() {
    let project = TestProject::new();
    project.file("src/math.js", MATH_JS);
    project.file(".snaps.jsonl", "");

    project
        .iosnap()
        .args(["test", "--format", "json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is missing or empty"));
}

#[test]
fn test_rejects_unknown_format() {
    let project = TestProject::new();
    project
        .iosnap()
        .args(["test", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'yaml'"));
}

#[test]
fn test_with_unmatched_pattern_reports_it() {
    let project = TestProject::new();
    project.file(
        ".snaps.jsonl",
        "{\"fnName\":\"add\",\"args\":[2,3],\"result\":5,\"at\":\"2026-01-01T00:00:00.000Z\"}\n",
    );

    project
        .iosnap()
        .args(["test", "lib/**/*.ts"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No files matched 'lib/**/*.ts'"));
}
