// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::shim::replay_harness;
use iosnap_adapters::{FakeReplayer, NodeReplayer, NodeReplayerConfig};
use iosnap_core::{ChangeKind, PathSegment};
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    _session: TempDir,
    paths: ProjectPaths,
    replayer: FakeReplayer,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let session = TempDir::new().unwrap();
        let paths =
            ProjectPaths::with_session_dir(root.path(), Some(session.path().join("s"))).unwrap();
        Self {
            _root: root,
            _session: session,
            paths,
            replayer: FakeReplayer::new(),
        }
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.paths.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn record(&self, events: &[CaptureEvent]) {
        let mut log = SnapshotLog::open(&self.paths.snapshot_log).unwrap();
        for event in events {
            log.append(event).unwrap();
        }
    }

    async fn verify(&self, only: &[&str]) -> Result<VerificationReport, VerifyError> {
        let only: Vec<String> = only.iter().map(|s| s.to_string()).collect();
        Verifier::new(self.paths.clone(), self.replayer.clone())
            .verify(None, &only)
            .await
    }
}

fn add_event(a: i64, b: i64, result: i64) -> CaptureEvent {
    CaptureEvent::new("add", vec![a.into(), b.into()], result.into())
}

fn sum(args: &[SnapValue]) -> f64 {
    args.iter()
        .map(|v| match v {
            SnapValue::Number(n) => *n,
            _ => 0.0,
        })
        .sum()
}

#[tokio::test]
async fn unchanged_function_passes() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5), add_event(1, 1, 2)]);
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args))));

    let report = fx.verify(&[]).await.unwrap();

    assert!(report.passed());
    assert_eq!(report.total_calls(), 2);
    assert_eq!(report.functions[0].status, FunctionStatus::Passed);

    let replayed = fx.replayer.calls();
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0].calls[0], vec![SnapValue::from(2_i64), SnapValue::from(3_i64)]);
}

#[tokio::test]
async fn mutated_function_drifts_at_root() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b + 1; }\n");
    fx.record(&[add_event(2, 3, 5)]);
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args) + 1.0)));

    let report = fx.verify(&[]).await.unwrap();

    assert!(!report.passed());
    let add = &report.functions[0];
    assert_eq!(add.status, FunctionStatus::Drift);
    assert_eq!(add.failed, 1);
    match &add.calls[0].problem {
        CallProblem::Drift { changes } => {
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].kind, ChangeKind::Change);
            assert_eq!(changes[0].path, Vec::<PathSegment>::new());
            assert_eq!(changes[0].value, Some(SnapValue::from(6_i64)));
        }
        other => panic!("expected drift, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_log_aborts_before_replay() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");

    let err = fx.verify(&[]).await.unwrap_err();

    assert!(matches!(err, VerifyError::NoSnapshots(_)));
    assert!(fx.replayer.calls().is_empty());
}

#[tokio::test]
async fn empty_log_aborts_too() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    std::fs::write(&fx.paths.snapshot_log, "\n").unwrap();

    let err = fx.verify(&[]).await.unwrap_err();
    assert!(matches!(err, VerifyError::NoSnapshots(_)));
}

#[tokio::test]
async fn unexported_function_is_not_found_but_others_run() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[
        CaptureEvent::new("gone", vec![], SnapValue::Null),
        add_event(2, 3, 5),
    ]);
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args))));

    let report = fx.verify(&[]).await.unwrap();

    assert_eq!(report.functions[0].name, "gone");
    assert_eq!(report.functions[0].status, FunctionStatus::NotFound);
    assert_eq!(report.functions[1].status, FunctionStatus::Passed);
    assert!(!report.passed());
}

#[tokio::test]
async fn filtered_name_without_records_is_skipped() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5)]);
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args))));

    let report = fx.verify(&["ghost", "add"]).await.unwrap();

    assert_eq!(report.functions.len(), 2);
    assert_eq!(report.functions[0].status, FunctionStatus::Skipped);
    assert_eq!(report.functions[1].status, FunctionStatus::Passed);
    assert!(report.passed());
}

#[tokio::test]
async fn filter_excludes_other_functions() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) {}\nexport function neg(a) {}\n");
    fx.record(&[
        add_event(2, 3, 5),
        CaptureEvent::new("neg", vec![1_i64.into()], (-1_i64).into()),
    ]);
    fx.replayer
        .define("neg", |_| CallOutcome::Returned(SnapValue::from(-1_i64)));

    let report = fx.verify(&["neg"]).await.unwrap();

    assert_eq!(report.functions.len(), 1);
    assert_eq!(report.functions[0].name, "neg");
    assert!(report.passed());
}

#[tokio::test]
async fn load_failure_falls_through_to_next_candidate() {
    let fx = Fixture::new();
    let first = fx.write("a.js", "export function add(a, b) { return a + b; }\n");
    let second = fx.write("b.js", "export const add = (a, b) => a + b;\n");
    fx.record(&[add_event(2, 3, 5)]);
    fx.replayer.break_module(&first);
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args))));

    let report = fx.verify(&[]).await.unwrap();

    assert!(report.passed());
    assert_eq!(report.functions[0].module.as_deref(), Some(second.as_path()));
    assert_eq!(fx.replayer.calls().len(), 2);
}

#[tokio::test]
async fn every_candidate_unloadable_is_not_found() {
    let fx = Fixture::new();
    let only = fx.write("a.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5)]);
    fx.replayer.break_module(&only);

    let report = fx.verify(&[]).await.unwrap();
    assert_eq!(report.functions[0].status, FunctionStatus::NotFound);
}

#[tokio::test]
async fn throwing_replay_fails_the_call() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5), add_event(1, 1, 2)]);
    fx.replayer.define("add", |args| {
        if sum(args) > 4.0 {
            CallOutcome::Threw("too big".to_string())
        } else {
            CallOutcome::Returned(SnapValue::Number(sum(args)))
        }
    });

    let report = fx.verify(&[]).await.unwrap();

    let add = &report.functions[0];
    assert_eq!(add.status, FunctionStatus::Drift);
    assert_eq!(add.total, 2);
    assert_eq!(add.failed, 1);
    assert_eq!(add.calls[0].index, 0);
    assert_eq!(
        add.calls[0].problem,
        CallProblem::Threw {
            error: "too big".to_string()
        }
    );
}

#[tokio::test]
async fn corrupt_lines_are_counted_not_fatal() {
    let fx = Fixture::new();
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5)]);
    let mut text = std::fs::read_to_string(&fx.paths.snapshot_log).unwrap();
    text.push_str("{not json\n");
    std::fs::write(&fx.paths.snapshot_log, text).unwrap();
    fx.replayer
        .define("add", |args| CallOutcome::Returned(SnapValue::Number(sum(args))));

    let report = fx.verify(&[]).await.unwrap();
    assert_eq!(report.skipped_records, 1);
    assert!(report.passed());
}

#[test]
fn report_serializes_status_inline() {
    let report = FunctionReport::unresolved("add", 3, FunctionStatus::NotFound);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"name": "add", "total": 3, "failed": 0, "status": "notFound"})
    );
}

fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

async fn verify_with_node(paths: &ProjectPaths) -> VerificationReport {
    let replayer = NodeReplayer::new(
        NodeReplayerConfig {
            node: "node".to_string(),
            node_args: vec![],
            cwd: paths.root.clone(),
            timeout: Duration::from_secs(30),
        },
        replay_harness(),
    );
    Verifier::new(paths.clone(), replayer)
        .verify(None, &[])
        .await
        .unwrap()
}

#[tokio::test]
async fn node_replay_passes_then_drifts_after_edit() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }
    let fx = Fixture::new();
    fx.write("package.json", "{\"type\":\"module\"}\n");
    fx.write("math.js", "export function add(a, b) { return a + b; }\n");
    fx.record(&[add_event(2, 3, 5)]);

    let report = verify_with_node(&fx.paths).await;
    assert!(report.passed(), "{report:?}");
    assert_eq!(report.functions[0].status, FunctionStatus::Passed);

    fx.write("math.js", "export function add(a, b) { return a + b + 1; }\n");
    let report = verify_with_node(&fx.paths).await;

    assert!(!report.passed());
    let add = &report.functions[0];
    assert_eq!(add.status, FunctionStatus::Drift);
    match &add.calls[0].problem {
        CallProblem::Drift { changes } => {
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].kind, ChangeKind::Change);
            assert!(changes[0].path.is_empty());
            assert_eq!(changes[0].old_value, Some(SnapValue::from(5_i64)));
            assert_eq!(changes[0].value, Some(SnapValue::from(6_i64)));
        }
        other => panic!("expected drift, got {other:?}"),
    }
}

#[tokio::test]
async fn node_replay_round_trips_tagged_values() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }
    let fx = Fixture::new();
    fx.write("package.json", "{\"type\":\"module\"}\n");
    fx.write(
        "tags.js",
        "export async function tag(items) { return new Set(items.map((i) => i + '!')); }\n",
    );
    let items = SnapValue::Array(vec!["a".into(), "b".into()]);
    let tagged = SnapValue::Set(vec!["a!".into(), "b!".into()]);
    fx.record(&[CaptureEvent::new("tag", vec![items], tagged)]);

    let report = verify_with_node(&fx.paths).await;

    assert!(report.passed(), "{report:?}");
}
