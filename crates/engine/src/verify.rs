// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot verification: replay recorded calls and diff the results

use crate::discover::{discover, DiscoverError};
use crate::registry::ExportRegistry;
use iosnap_adapters::{CallOutcome, ReplayError, Replayer};
use iosnap_core::config::DEFAULT_PATTERN;
use iosnap_core::{diff, CaptureEvent, Change, ProjectPaths, SnapValue};
use iosnap_storage::{group_by_function, LogError, SnapshotLog};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no snapshots found in {}", .0.display())]
    NoSnapshots(PathBuf),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("failed to read snapshot log: {0}")]
    Log(#[from] LogError),
}

/// Why one replayed call did not pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallProblem {
    /// Result differs from the recording
    Drift { changes: Vec<Change> },
    /// The call threw or rejected
    Threw { error: String },
}

/// A failing call, identified by its position among the function's records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReport {
    pub index: usize,
    pub args: Vec<SnapValue>,
    #[serde(flatten)]
    pub problem: CallProblem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FunctionStatus {
    Passed,
    /// At least one call drifted or threw
    Drift,
    /// No candidate file exports the name, or none could be loaded
    NotFound,
    /// Requested by filter but never recorded
    Skipped,
    /// The replay itself could not run (timeout, crashed harness)
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReport {
    pub name: String,
    /// Module the calls were replayed against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<PathBuf>,
    pub total: usize,
    pub failed: usize,
    #[serde(flatten)]
    pub status: FunctionStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallReport>,
}

impl FunctionReport {
    fn unresolved(name: &str, total: usize, status: FunctionStatus) -> Self {
        Self {
            name: name.to_string(),
            module: None,
            total,
            failed: 0,
            status,
            calls: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, FunctionStatus::Passed | FunctionStatus::Skipped)
    }
}

/// Whole-run result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub functions: Vec<FunctionReport>,
    /// Corrupt log lines that were ignored
    pub skipped_records: usize,
}

impl VerificationReport {
    /// True only if every function passed or was skipped
    pub fn passed(&self) -> bool {
        self.functions.iter().all(FunctionReport::is_ok)
    }

    pub fn total_calls(&self) -> usize {
        self.functions.iter().map(|f| f.total).sum()
    }

    pub fn failed_calls(&self) -> usize {
        self.functions.iter().map(|f| f.failed).sum()
    }

    pub fn count(&self, pred: impl Fn(&FunctionStatus) -> bool) -> usize {
        self.functions.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Replays the snapshot log of one project
pub struct Verifier<R: Replayer> {
    paths: ProjectPaths,
    replayer: R,
}

impl<R: Replayer> Verifier<R> {
    pub fn new(paths: ProjectPaths, replayer: R) -> Self {
        Self { paths, replayer }
    }

    /// Verify every recorded function (or only those named in `only`)
    /// against the files matching `pattern`.
    pub async fn verify(
        &self,
        pattern: Option<&str>,
        only: &[String],
    ) -> Result<VerificationReport, VerifyError> {
        let log_path = &self.paths.snapshot_log;
        let read = SnapshotLog::read(log_path)?
            .filter(|read| !read.events.is_empty())
            .ok_or_else(|| VerifyError::NoSnapshots(log_path.clone()))?;
        if read.skipped > 0 {
            warn!(skipped = read.skipped, "ignored corrupt snapshot records");
        }

        let files = discover(&self.paths.root, pattern.unwrap_or(DEFAULT_PATTERN))?;
        let registry = ExportRegistry::build(&files);
        debug!(files = files.len(), names = registry.len(), "built export registry");

        let mut groups = group_by_function(read.events);
        if !only.is_empty() {
            groups = select(groups, only);
        }

        let mut report = VerificationReport {
            functions: Vec::with_capacity(groups.len()),
            skipped_records: read.skipped,
        };
        for (name, records) in groups {
            let function = if records.is_empty() {
                info!(function = %name, "no recorded calls, skipping");
                FunctionReport::unresolved(&name, 0, FunctionStatus::Skipped)
            } else {
                self.verify_function(&registry, &name, &records).await
            };
            report.functions.push(function);
        }
        Ok(report)
    }

    async fn verify_function(
        &self,
        registry: &ExportRegistry,
        name: &str,
        records: &[CaptureEvent],
    ) -> FunctionReport {
        let calls: Vec<Vec<SnapValue>> = records.iter().map(|r| r.args.clone()).collect();

        for module in registry.candidates(name) {
            match self.replayer.replay(module, name, &calls).await {
                Ok(outcomes) if outcomes.len() != records.len() => {
                    let reason = format!(
                        "expected {} results, replay produced {}",
                        records.len(),
                        outcomes.len()
                    );
                    return FunctionReport {
                        module: Some(module.clone()),
                        ..FunctionReport::unresolved(
                            name,
                            records.len(),
                            FunctionStatus::Failed { reason },
                        )
                    };
                }
                Ok(outcomes) => return compare(name, module, records, outcomes),
                Err(e) if e.is_load_failure() => {
                    debug!(function = %name, module = %module.display(), error = %e, "trying next candidate");
                }
                Err(e) => return failed(name, module, records.len(), &e),
            }
        }

        warn!(function = %name, "no loadable module exports this function");
        FunctionReport::unresolved(name, records.len(), FunctionStatus::NotFound)
    }
}

/// Keep only the groups named in `only`, in filter order; unrecorded names
/// get an empty group
fn select(
    mut groups: Vec<(String, Vec<CaptureEvent>)>,
    only: &[String],
) -> Vec<(String, Vec<CaptureEvent>)> {
    let mut selected: Vec<(String, Vec<CaptureEvent>)> = Vec::with_capacity(only.len());
    for name in only {
        if selected.iter().any(|(n, _)| n == name) {
            continue;
        }
        let records = match groups.iter().position(|(n, _)| n == name) {
            Some(at) => groups.swap_remove(at).1,
            None => Vec::new(),
        };
        selected.push((name.clone(), records));
    }
    selected
}

fn compare(
    name: &str,
    module: &Path,
    records: &[CaptureEvent],
    outcomes: Vec<CallOutcome>,
) -> FunctionReport {
    let calls: Vec<CallReport> = records
        .iter()
        .zip(outcomes)
        .enumerate()
        .filter_map(|(index, (record, outcome))| {
            let problem = match outcome {
                CallOutcome::Returned(value) => {
                    let changes = diff(&record.result, &value);
                    if changes.is_empty() {
                        return None;
                    }
                    CallProblem::Drift { changes }
                }
                CallOutcome::Threw(error) => CallProblem::Threw { error },
            };
            Some(CallReport {
                index,
                args: record.args.clone(),
                problem,
            })
        })
        .collect();

    let status = if calls.is_empty() {
        FunctionStatus::Passed
    } else {
        FunctionStatus::Drift
    };
    info!(function = %name, total = records.len(), failed = calls.len(), "verified");

    FunctionReport {
        name: name.to_string(),
        module: Some(module.to_path_buf()),
        total: records.len(),
        failed: calls.len(),
        status,
        calls,
    }
}

fn failed(name: &str, module: &Path, total: usize, error: &ReplayError) -> FunctionReport {
    warn!(function = %name, module = %module.display(), error = %error, "replay failed");
    FunctionReport {
        module: Some(module.to_path_buf()),
        ..FunctionReport::unresolved(
            name,
            total,
            FunctionStatus::Failed {
                reason: error.to_string(),
            },
        )
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
