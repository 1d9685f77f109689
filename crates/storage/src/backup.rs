// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pristine copies of instrumented source files
//!
//! Every backup is written twice: a primary copy in the ephemeral session
//! directory and a fallback copy inside the project. A file with either copy
//! is considered instrumented.

use iosnap_core::paths::{strip_backup_ext, BACKUP_EXT};
use iosnap_core::ProjectPaths;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("no backup found for {0}")]
    Missing(PathBuf),
    #[error("backup I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid backup pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Where the two copies of one file live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    pub primary: PathBuf,
    pub fallback: PathBuf,
}

/// Which copy a restore used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    Primary,
    Fallback,
}

/// Backup store for one project
#[derive(Debug, Clone)]
pub struct BackupStore {
    paths: ProjectPaths,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> BackupError + '_ {
    move |source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl BackupStore {
    pub fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Locations of both copies for `file`
    pub fn locations(&self, file: &Path) -> BackupPaths {
        BackupPaths {
            primary: self.paths.primary_backup(file),
            fallback: self.paths.fallback_backup(file),
        }
    }

    /// Copy the current content of `file` to both locations
    pub fn backup(&self, file: &Path) -> Result<BackupPaths, BackupError> {
        let content = std::fs::read(file).map_err(io_err(file))?;
        let locations = self.locations(file);

        for target in [&locations.primary, &locations.fallback] {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            std::fs::write(target, &content).map_err(io_err(target))?;
        }

        debug!(file = %file.display(), "backed up");
        Ok(locations)
    }

    /// Overwrite `file` with its backup, preferring the primary copy.
    ///
    /// Backups are left in place; see [`BackupStore::discard`].
    pub fn restore(&self, file: &Path) -> Result<RestoreSource, BackupError> {
        let locations = self.locations(file);

        let (source, from) = if locations.primary.is_file() {
            (RestoreSource::Primary, &locations.primary)
        } else if locations.fallback.is_file() {
            warn!(
                file = %file.display(),
                "primary backup missing, restoring from project-local fallback"
            );
            (RestoreSource::Fallback, &locations.fallback)
        } else {
            return Err(BackupError::Missing(file.to_path_buf()));
        };

        let content = std::fs::read(from).map_err(io_err(from))?;
        let target = self.absolute(file);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        std::fs::write(&target, content).map_err(io_err(&target))?;

        debug!(file = %file.display(), ?source, "restored");
        Ok(source)
    }

    /// True if either copy exists
    pub fn has_backup(&self, file: &Path) -> bool {
        let locations = self.locations(file);
        locations.primary.is_file() || locations.fallback.is_file()
    }

    /// Remove both copies of one file
    pub fn discard(&self, file: &Path) -> Result<(), BackupError> {
        let locations = self.locations(file);
        for target in [&locations.primary, &locations.fallback] {
            match std::fs::remove_file(target) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(target)(e)),
            }
        }
        Ok(())
    }

    /// Every original file (absolute, sorted) with a backup in either tree
    pub fn backed_up_files(&self) -> Result<Vec<PathBuf>, BackupError> {
        let mut files = BTreeSet::new();
        for tree in [&self.paths.backup_dir, &self.paths.local_backup_dir] {
            if !tree.is_dir() {
                continue;
            }
            let pattern = format!(
                "{}/**/*{}",
                glob::Pattern::escape(&tree.to_string_lossy()),
                BACKUP_EXT
            );
            for entry in glob::glob(&pattern)? {
                let artifact = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "unreadable backup entry");
                        continue;
                    }
                };
                let Ok(rel) = artifact.strip_prefix(tree) else {
                    continue;
                };
                if let Some(original) = strip_backup_ext(rel) {
                    files.insert(self.paths.root.join(original));
                }
            }
        }
        Ok(files.into_iter().collect())
    }

    /// Remove both backup trees entirely
    pub fn cleanup(&self) -> Result<(), BackupError> {
        for tree in [&self.paths.backup_dir, &self.paths.local_backup_dir] {
            match std::fs::remove_dir_all(tree) {
                Ok(()) => debug!(dir = %tree.display(), "removed backup tree"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(tree)(e)),
            }
        }
        Ok(())
    }

    fn absolute(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.paths.root.join(file)
        }
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
