// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export registry: which files export which names

use crate::syntax::{self, Dialect};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Map from exported name to the files exporting it, in file order
#[derive(Debug, Default)]
pub struct ExportRegistry {
    by_name: HashMap<String, Vec<PathBuf>>,
}

impl ExportRegistry {
    /// Statically scan `files` (already sorted) for top-level exports.
    ///
    /// Unreadable or unparsable files are skipped with a warning.
    pub fn build(files: &[PathBuf]) -> Self {
        let mut registry = Self::default();
        for file in files {
            match scan(file) {
                Ok(names) => {
                    for name in names {
                        registry.insert(name, file);
                    }
                }
                Err(reason) => warn!(file = %file.display(), %reason, "skipping file in export scan"),
            }
        }
        registry
    }

    fn insert(&mut self, name: String, file: &Path) {
        let files = self.by_name.entry(name).or_default();
        if !files.iter().any(|f| f == file) {
            files.push(file.to_path_buf());
        }
    }

    /// Files exporting `name`, first match first
    pub fn candidates(&self, name: &str) -> &[PathBuf] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn scan(file: &Path) -> Result<Vec<String>, String> {
    let dialect = Dialect::from_path(file).ok_or_else(|| "unsupported extension".to_string())?;
    let source = std::fs::read_to_string(file).map_err(|e| e.to_string())?;
    let tree = syntax::parse(&source, dialect).map_err(|e| e.to_string())?;
    Ok(syntax::exports(tree.root_node(), &source)
        .iter()
        .flat_map(|export| export.names(&source))
        .collect())
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
