// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use iosnap_core::{Change, ChangeKind, SnapValue};
use iosnap_engine::CallReport;
use std::path::PathBuf;

fn function(name: &str, total: usize, failed: usize, status: FunctionStatus) -> FunctionReport {
    FunctionReport {
        name: name.to_string(),
        module: Some(PathBuf::from("/app/src/math.js")),
        total,
        failed,
        status,
        calls: Vec::new(),
    }
}

fn drifted() -> FunctionReport {
    FunctionReport {
        calls: vec![
            CallReport {
                index: 0,
                args: vec![SnapValue::from(2_i64), SnapValue::from(3_i64)],
                problem: CallProblem::Drift {
                    changes: vec![Change {
                        path: Vec::new(),
                        kind: ChangeKind::Change,
                        value: Some(SnapValue::from(6_i64)),
                        old_value: Some(SnapValue::from(5_i64)),
                    }],
                },
            },
            CallReport {
                index: 1,
                args: vec![SnapValue::String("x".into())],
                problem: CallProblem::Threw {
                    error: "bad input".into(),
                },
            },
        ],
        ..function("add", 3, 2, FunctionStatus::Drift)
    }
}

#[test]
fn passing_report() {
    let report = VerificationReport {
        functions: vec![function("add", 1, 0, FunctionStatus::Passed)],
        skipped_records: 0,
    };
    let text = ReportView::new(Path::new("/app"), &report).to_string();
    assert!(text.contains("PASS     add (1 call)\n"));
    assert!(!text.contains("in src/math.js"));
    assert!(text.contains("1 function, 1 call: 1 passed\n"));
    assert!(text.ends_with("PASSED\n"));
}

#[test]
fn drift_lists_each_failing_call() {
    let report = VerificationReport {
        functions: vec![drifted()],
        skipped_records: 0,
    };
    let text = ReportView::new(Path::new("/app"), &report).to_string();
    assert!(text.contains("DRIFT    add (2 of 3 calls failed)\n"));
    assert!(text.contains("         in src/math.js\n"));
    assert!(text.contains("         call #0 (2, 3)\n           CHANGE (root): 5 -> 6\n"));
    assert!(text.contains("         call #1 (\"x\") threw: bad input\n"));
    assert!(text.contains("0 passed, 1 drifted"));
    assert!(text.ends_with("FAILED\n"));
}

#[test]
fn summary_counts_every_status() {
    let report = VerificationReport {
        functions: vec![
            function("a", 2, 0, FunctionStatus::Passed),
            function("b", 1, 0, FunctionStatus::NotFound),
            function("c", 0, 0, FunctionStatus::Skipped),
            function(
                "d",
                4,
                0,
                FunctionStatus::Failed {
                    reason: "replay timed out".into(),
                },
            ),
        ],
        skipped_records: 2,
    };
    let text = ReportView::new(Path::new("/app"), &report).to_string();
    assert!(text.contains("MISSING  b (1 call): not exported by any matching file"));
    assert!(text.contains("SKIP     c: no recorded calls"));
    assert!(text.contains("FAIL     d (4 calls): replay timed out"));
    assert!(text.contains("4 functions, 7 calls: 1 passed, 1 not found, 1 skipped, 1 failed\n"));
    assert!(text.contains("2 corrupt records ignored\n"));
}

#[test]
fn json_carries_pass_flag_and_functions() {
    let report = VerificationReport {
        functions: vec![drifted()],
        skipped_records: 0,
    };
    let json = serde_json::to_value(ReportView::new(Path::new("/app"), &report)).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["skippedRecords"], 0);
    assert_eq!(json["functions"][0]["status"], "drift");
    assert_eq!(json["functions"][0]["calls"][0]["kind"], "drift");
    assert!(json.get("root").is_none());
}

#[test]
fn pluralizes() {
    assert_eq!(plural(0, "call"), "0 calls");
    assert_eq!(plural(1, "call"), "1 call");
}
