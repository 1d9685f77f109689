// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replaying recorded calls against current code

mod node;

pub use node::{NodeReplayer, NodeReplayerConfig, RESULT_SENTINEL};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeReplayer, ReplayCall};

use async_trait::async_trait;
use iosnap_core::SnapValue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from replay operations
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to load {}: {reason}", module.display())]
    LoadFailed { module: PathBuf, reason: String },
    #[error("{} does not export a function named {name}", module.display())]
    ExportMissing { module: PathBuf, name: String },
    #[error("failed to start replay process: {0}")]
    Spawn(String),
    #[error("replay timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed replay output: {0}")]
    Protocol(String),
}

impl ReplayError {
    /// True when another module exporting the same name is worth trying
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            ReplayError::LoadFailed { .. } | ReplayError::ExportMissing { .. }
        )
    }
}

/// What one replayed call produced
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Returned (or resolved to) a value
    Returned(SnapValue),
    /// Threw (or rejected) with a message
    Threw(String),
}

/// Loads a module and invokes one of its exports
#[async_trait]
pub trait Replayer: Clone + Send + Sync + 'static {
    /// Call export `name` of `module` once per argument list, in order.
    ///
    /// Returns one outcome per call. An error means the module or export
    /// could not be reached at all.
    async fn replay(
        &self,
        module: &Path,
        name: &str,
        calls: &[Vec<SnapValue>],
    ) -> Result<Vec<CallOutcome>, ReplayError>;
}
