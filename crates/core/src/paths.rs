// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known locations for one project: session directory, backups,
//! snapshot log, daemon files.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension appended to backup copies
pub const BACKUP_EXT: &str = ".snap.bak";

/// Project-local fallback backup directory
pub const LOCAL_BACKUP_DIR: &str = ".io-snapshot-backups";

/// Snapshot log file name, relative to the project root
pub const SNAPSHOT_LOG: &str = ".snaps.jsonl";

/// Configuration file name, relative to the project root
pub const CONFIG_FILE: &str = ".iosnapshotrc.json";

const SESSION_DIR_PREFIX: &str = "io-snapshot-session-";

/// Overrides the per-project session directory
pub const SESSION_DIR_ENV: &str = "IOSNAP_SESSION_DIR";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("project not found at {0}: {1}")]
    ProjectNotFound(PathBuf, std::io::Error),
}

/// Resolved locations for a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Canonical project root
    pub root: PathBuf,
    /// Ephemeral per-project session directory
    pub session_dir: PathBuf,
    /// Primary backup tree (inside the session directory)
    pub backup_dir: PathBuf,
    /// Fallback backup tree (inside the project)
    pub local_backup_dir: PathBuf,
    /// Daemon lock/PID file
    pub pid_path: PathBuf,
    /// Daemon log file
    pub daemon_log: PathBuf,
    /// Append-only capture log
    pub snapshot_log: PathBuf,
    /// Optional config file
    pub config_file: PathBuf,
}

impl ProjectPaths {
    /// Resolve paths for the project at `root`, honoring `IOSNAP_SESSION_DIR`
    pub fn for_project(root: &Path) -> Result<Self, PathError> {
        let session_override = std::env::var_os(SESSION_DIR_ENV).map(PathBuf::from);
        Self::with_session_dir(root, session_override)
    }

    /// Resolve paths with an explicit session directory (or the default under
    /// the system temp dir when `None`)
    pub fn with_session_dir(root: &Path, session_dir: Option<PathBuf>) -> Result<Self, PathError> {
        let root = root
            .canonicalize()
            .map_err(|e| PathError::ProjectNotFound(root.to_path_buf(), e))?;

        let session_dir = session_dir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("{}{}", SESSION_DIR_PREFIX, project_hash(&root)))
        });

        Ok(Self {
            backup_dir: session_dir.join("backup"),
            local_backup_dir: root.join(LOCAL_BACKUP_DIR),
            pid_path: session_dir.join("daemon.pid"),
            daemon_log: session_dir.join("daemon.log"),
            snapshot_log: root.join(SNAPSHOT_LOG),
            config_file: root.join(CONFIG_FILE),
            session_dir,
            root,
        })
    }

    /// Path of `file` relative to the project root.
    ///
    /// Files outside the root keep their full path with the root component
    /// stripped, so their backups still land inside the backup trees.
    pub fn relative(&self, file: &Path) -> PathBuf {
        let absolute = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.root.join(file)
        };
        match absolute.strip_prefix(&self.root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => absolute.components().skip(1).collect(),
        }
    }

    /// Primary backup location for a source file
    pub fn primary_backup(&self, file: &Path) -> PathBuf {
        with_backup_ext(self.backup_dir.join(self.relative(file)))
    }

    /// Fallback backup location for a source file
    pub fn fallback_backup(&self, file: &Path) -> PathBuf {
        with_backup_ext(self.local_backup_dir.join(self.relative(file)))
    }
}

fn with_backup_ext(path: PathBuf) -> PathBuf {
    let mut os = path.into_os_string();
    os.push(BACKUP_EXT);
    PathBuf::from(os)
}

/// Map a backup artifact path back to the source path it protects
pub fn strip_backup_ext(path: &Path) -> Option<PathBuf> {
    let text = path.to_str()?;
    text.strip_suffix(BACKUP_EXT).map(PathBuf::from)
}

/// Stable short hash of a canonical project root
pub fn project_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
