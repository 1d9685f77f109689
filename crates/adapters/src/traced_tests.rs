// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::replay::FakeReplayer;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a future with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

#[test]
fn traced_replay_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeReplayer::new();
        fake.define("total", |_| CallOutcome::Returned(SnapValue::from(1_i64)));
        TracedReplayer::new(fake)
            .replay(Path::new("/p/cart.js"), "total", &[vec![], vec![]])
            .await
    });

    assert_eq!(result.unwrap().len(), 2);
    assert!(logs.contains("replay"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("cart.js"), "Should log module. Logs:\n{}", logs);
    assert!(logs.contains("calls=2"), "Should log batch size. Logs:\n{}", logs);
    assert!(logs.contains("replayed"), "Should log completion. Logs:\n{}", logs);
    assert!(logs.contains("elapsed_ms"), "Should log timing. Logs:\n{}", logs);
}

#[test]
fn traced_replay_warns_on_load_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeReplayer::new();
        fake.break_module(Path::new("/p/broken.js"));
        TracedReplayer::new(fake)
            .replay(Path::new("/p/broken.js"), "total", &[])
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("WARN"), "Should warn. Logs:\n{}", logs);
    assert!(logs.contains("module unusable"), "Logs:\n{}", logs);
}

#[tokio::test]
async fn traced_replay_passes_outcomes_through() {
    let fake = FakeReplayer::new();
    fake.define("boom", |_| CallOutcome::Threw("nope".to_string()));
    let traced = TracedReplayer::new(fake.clone());

    let outcomes = traced
        .replay(Path::new("/p/a.js"), "boom", &[vec![]])
        .await
        .unwrap();

    assert_eq!(outcomes, vec![CallOutcome::Threw("nope".to_string())]);
    assert_eq!(fake.calls().len(), 1);
}
