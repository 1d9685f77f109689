// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::replay::{CallOutcome, ReplayError, Replayer};
use async_trait::async_trait;
use iosnap_core::SnapValue;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any Replayer
#[derive(Clone)]
pub struct TracedReplayer<R> {
    inner: R,
}

impl<R> TracedReplayer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: Replayer> Replayer for TracedReplayer<R> {
    async fn replay(
        &self,
        module: &Path,
        name: &str,
        calls: &[Vec<SnapValue>],
    ) -> Result<Vec<CallOutcome>, ReplayError> {
        let span = tracing::info_span!("replay", name, module = %module.display());
        span.in_scope(|| tracing::info!(calls = calls.len(), "starting"));

        let start = std::time::Instant::now();
        let result = self
            .inner
            .replay(module, name, calls)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();
        let _guard = span.enter();

        match &result {
            Ok(outcomes) => {
                let threw = outcomes
                    .iter()
                    .filter(|o| matches!(o, CallOutcome::Threw(_)))
                    .count();
                tracing::info!(
                    threw,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "replayed"
                )
            }
            // A load failure falls through to the next candidate module
            Err(e) if e.is_load_failure() => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "module unusable"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "replay failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
