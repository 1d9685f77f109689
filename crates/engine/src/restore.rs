// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverting instrumentation and removing session artifacts

use crate::discover::{discover, DiscoverError};
use iosnap_storage::{BackupError, BackupStore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error(transparent)]
    Discover(DiscoverError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("failed to remove {path}: {source}")]
    RemoveLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file whose restore failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a restore run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub restored: Vec<PathBuf>,
    /// Requested files with neither backup copy
    pub missing: Vec<PathBuf>,
    pub failed: Vec<RestoreFailure>,
    /// True when backup copies were removed afterwards
    pub backups_removed: bool,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of `clean`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    #[serde(flatten)]
    pub restore: RestoreReport,
    pub log_removed: bool,
}

/// Restores instrumented files from a [`BackupStore`]
pub struct Restorer {
    store: BackupStore,
}

impl Restorer {
    pub fn new(store: BackupStore) -> Self {
        Self { store }
    }

    /// Restore every backed-up file, or only those matching `pattern`.
    ///
    /// Backups of restored files are removed afterwards. Without a pattern
    /// both backup trees go. Nothing is removed if any restore failed, so
    /// the pristine copies survive for a retry.
    pub fn restore(&self, pattern: Option<&str>) -> Result<RestoreReport, RestoreError> {
        let backed_up = self.store.backed_up_files()?;
        let targets = match pattern {
            None => backed_up,
            Some(pattern) => {
                let backed_up: BTreeSet<PathBuf> = backed_up.into_iter().collect();
                self.matching(pattern)?
                    .into_iter()
                    .filter(|file| {
                        let known = backed_up.contains(file);
                        if !known {
                            warn!(file = %file.display(), "no backup to restore");
                        }
                        known
                    })
                    .collect()
            }
        };

        let mut report = RestoreReport::default();
        for file in targets {
            match self.store.restore(&file) {
                Ok(_) => {
                    info!(file = %file.display(), "restored");
                    report.restored.push(file);
                }
                Err(BackupError::Missing(_)) => {
                    warn!(file = %file.display(), "backup missing, file left as is");
                    report.missing.push(file);
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "restore failed");
                    report.failed.push(RestoreFailure {
                        path: file,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !report.is_clean() {
            warn!(
                failed = report.failed.len(),
                "keeping backups because some files could not be restored"
            );
            return Ok(report);
        }

        match pattern {
            None => self.store.cleanup()?,
            Some(_) => {
                for file in &report.restored {
                    self.store.discard(file)?;
                }
            }
        }
        report.backups_removed = true;
        Ok(report)
    }

    /// Restore files, then delete the snapshot log
    pub fn clean(&self, pattern: Option<&str>) -> Result<CleanReport, RestoreError> {
        let restore = self.restore(pattern)?;

        let log = &self.store.paths().snapshot_log;
        let log_removed = match std::fs::remove_file(log) {
            Ok(()) => {
                info!(path = %log.display(), "removed snapshot log");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(source) => {
                return Err(RestoreError::RemoveLog {
                    path: log.clone(),
                    source,
                })
            }
        };

        Ok(CleanReport {
            restore,
            log_removed,
        })
    }

    fn matching(&self, pattern: &str) -> Result<Vec<PathBuf>, RestoreError> {
        match discover(&self.store.paths().root, pattern) {
            Ok(files) => Ok(files),
            Err(DiscoverError::NoFilesMatched(_)) => Ok(Vec::new()),
            Err(e) => Err(RestoreError::Discover(e)),
        }
    }
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
