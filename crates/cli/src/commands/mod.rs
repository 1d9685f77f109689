// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod clean;
pub mod inject;
pub mod record;
pub mod status;
pub mod stop;
pub mod verify;

use crate::error::SnapError;
use anyhow::Result;
use iosnap_core::{Config, PathError, ProjectPaths};
use iosnap_storage::BackupStore;
use std::path::{Path, PathBuf};

/// Resolved project: locations plus effective configuration
pub struct Project {
    pub paths: ProjectPaths,
    pub config: Config,
}

impl Project {
    /// Resolve `root` (default: the current directory)
    pub fn open(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let paths = ProjectPaths::for_project(&root).map_err(|e| match e {
            PathError::ProjectNotFound(path, source) => {
                SnapError::new(format!("Project directory not found: {}", path.display()))
                    .with_suggestion("Pass an existing directory with --project <dir>")
                    .with_source(source)
            }
        })?;
        let config = Config::load(&paths.root);
        Ok(Self { paths, config })
    }

    pub fn store(&self) -> BackupStore {
        BackupStore::new(self.paths.clone())
    }

    /// Path for display, relative to the project root when possible
    pub fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.paths.root).unwrap_or(path).display()
    }
}
