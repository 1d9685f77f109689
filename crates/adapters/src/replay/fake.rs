// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake replayer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CallOutcome, ReplayError, Replayer};
use async_trait::async_trait;
use iosnap_core::SnapValue;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type Behavior = Arc<dyn Fn(&[SnapValue]) -> CallOutcome + Send + Sync>;

/// Recorded replay call
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayCall {
    pub module: PathBuf,
    pub name: String,
    pub calls: Vec<Vec<SnapValue>>,
}

/// In-memory replayer: functions are closures keyed by export name
#[derive(Clone, Default)]
pub struct FakeReplayer {
    functions: Arc<Mutex<HashMap<String, Behavior>>>,
    broken_modules: Arc<Mutex<HashSet<PathBuf>>>,
    calls: Arc<Mutex<Vec<ReplayCall>>>,
}

impl FakeReplayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the export `name` for every module
    pub fn define(
        &self,
        name: &str,
        f: impl Fn(&[SnapValue]) -> CallOutcome + Send + Sync + 'static,
    ) {
        self.functions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), Arc::new(f));
    }

    /// Make loading `module` fail
    pub fn break_module(&self, module: &Path) {
        self.broken_modules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(module.to_path_buf());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ReplayCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Replayer for FakeReplayer {
    async fn replay(
        &self,
        module: &Path,
        name: &str,
        calls: &[Vec<SnapValue>],
    ) -> Result<Vec<CallOutcome>, ReplayError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ReplayCall {
                module: module.to_path_buf(),
                name: name.to_string(),
                calls: calls.to_vec(),
            });

        if self
            .broken_modules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(module)
        {
            return Err(ReplayError::LoadFailed {
                module: module.to_path_buf(),
                reason: "fake load failure".to_string(),
            });
        }

        let behavior = self
            .functions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| ReplayError::ExportMissing {
                module: module.to_path_buf(),
                name: name.to_string(),
            })?;

        Ok(calls.iter().map(|args| behavior(args)).collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
