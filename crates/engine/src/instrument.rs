// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instrumentation: wrapping exported functions with the capture shim
//!
//! Per file: idempotency check, backup, parse, rewrite, validate, atomic
//! write. Any failure after the backup restores the original and discards
//! the backup pair.

use crate::discover::{discover, DiscoverError};
use crate::edit::{apply_edits, write_atomic, Edit, EditError};
use crate::shim::{self, SHADOW_PREFIX};
use crate::syntax::{self, Dialect, ExportKind, SyntaxError, BOOTSTRAP_MARKER};
use iosnap_storage::{BackupError, BackupStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("unsupported file type: {0}")]
    UnsupportedFile(PathBuf),
    #[error("parse error: {0}")]
    Parse(#[from] SyntaxError),
    #[error("rewrite produced invalid code: {0}")]
    InvalidOutput(SyntaxError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of rewriting one source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Exported names now wrapped, in source order
    pub functions: Vec<String>,
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Injected { functions: Vec<String> },
    AlreadyInjected,
    NoExports,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Outcome of an inject run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectReport {
    pub files: Vec<FileReport>,
}

impl InjectReport {
    pub fn injected(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Injected { .. }))
    }

    pub fn already_injected(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::AlreadyInjected))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Total wrapped functions across files
    pub fn functions(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.outcome {
                FileOutcome::Injected { functions } => functions.len(),
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Rewrites source files in place, backed by a [`BackupStore`]
pub struct Instrumenter {
    store: BackupStore,
    port: u16,
}

impl Instrumenter {
    /// `port` is baked into each bootstrap
    pub fn new(store: BackupStore, port: u16) -> Self {
        Self { store, port }
    }

    /// Instrument every file under the project root matching `pattern`
    pub fn inject(&self, pattern: &str, force: bool) -> Result<InjectReport, InstrumentError> {
        let files = discover(&self.store.paths().root, pattern)?;
        Ok(self.inject_files(&files, force))
    }

    /// Instrument `files` in order; one file's failure never stops the rest
    pub fn inject_files(&self, files: &[PathBuf], force: bool) -> InjectReport {
        let files = files
            .iter()
            .map(|path| {
                let outcome = match self.inject_file(path, force) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "instrumentation failed");
                        FileOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                FileReport {
                    path: path.clone(),
                    outcome,
                }
            })
            .collect();
        InjectReport { files }
    }

    /// Instrument one file
    pub fn inject_file(&self, path: &Path, force: bool) -> Result<FileOutcome, InstrumentError> {
        let dialect =
            Dialect::from_path(path).ok_or_else(|| InstrumentError::UnsupportedFile(path.into()))?;

        if self.store.has_backup(path) {
            if !force {
                debug!(file = %path.display(), "already instrumented");
                return Ok(FileOutcome::AlreadyInjected);
            }
            // Start from the pristine copy instead of compounding wrappers
            self.store.restore(path)?;
        }

        if let Err(e) = self.store.backup(path) {
            // A half-written pair would mark the pristine file as instrumented
            if let Err(discard_err) = self.store.discard(path) {
                warn!(file = %path.display(), error = %discard_err, "partial backup left behind");
            }
            return Err(e.into());
        }

        match self.rewrite_in_place(path, dialect) {
            Ok(Some(functions)) => {
                info!(file = %path.display(), functions = functions.len(), "instrumented");
                Ok(FileOutcome::Injected { functions })
            }
            Ok(None) => {
                self.store.discard(path)?;
                Ok(FileOutcome::NoExports)
            }
            Err(e) => {
                if let Err(restore_err) = self.store.restore(path) {
                    warn!(file = %path.display(), error = %restore_err, "rollback failed");
                    return Err(e);
                }
                self.store.discard(path)?;
                Err(e)
            }
        }
    }

    fn rewrite_in_place(
        &self,
        path: &Path,
        dialect: Dialect,
    ) -> Result<Option<Vec<String>>, InstrumentError> {
        let source = std::fs::read_to_string(path).map_err(|source| InstrumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(rewrite) = rewrite(&source, dialect, self.port)? else {
            return Ok(None);
        };
        write_atomic(path, &rewrite.text)?;
        Ok(Some(rewrite.functions))
    }
}

/// Rewrite `source` so every exported function goes through the shim.
///
/// Returns `None` when nothing was wrapped; the source is then untouched.
pub fn rewrite(
    source: &str,
    dialect: Dialect,
    port: u16,
) -> Result<Option<Rewrite>, InstrumentError> {
    let tree = syntax::parse(source, dialect)?;
    let root = tree.root_node();
    let exports = syntax::exports(root, source);

    let wrappable = |name: &str| !name.starts_with(SHADOW_PREFIX) && name != BOOTSTRAP_MARKER;

    // Names that have a body to wrap; overload signatures follow these
    let implemented: HashSet<&str> = exports
        .iter()
        .filter_map(|export| match &export.kind {
            ExportKind::Function { name } => Some(syntax::text(*name, source)),
            _ => None,
        })
        .filter(|name| wrappable(*name))
        .collect();

    let mut edits = Vec::new();
    let mut functions = Vec::new();

    for export in &exports {
        let Some(declaration) = export.declaration else {
            continue;
        };
        let statement = export.statement;
        let drop_export = Edit::delete(statement.start_byte(), declaration.start_byte());

        match &export.kind {
            ExportKind::Function { name } => {
                let name_text = syntax::text(*name, source);
                if !wrappable(name_text) {
                    continue;
                }
                edits.push(drop_export);
                edits.push(rename(*name, name_text));
                edits.push(Edit::insert(
                    statement.end_byte(),
                    format!("\n{}", shim::wrapper_export(name_text)),
                ));
                functions.push(name_text.to_string());
            }
            ExportKind::Signature { name } => {
                let name_text = syntax::text(*name, source);
                if implemented.contains(name_text) {
                    edits.push(drop_export);
                    edits.push(rename(*name, name_text));
                }
            }
            ExportKind::Variables { declarators } => {
                let wraps: Vec<_> = declarators
                    .iter()
                    .filter(|d| d.simple && d.is_function)
                    .filter(|d| wrappable(syntax::text(d.name, source)))
                    .collect();
                // Destructuring patterns cannot be re-exported by name
                if wraps.is_empty() || declarators.iter().any(|d| !d.simple) {
                    continue;
                }

                edits.push(drop_export);
                let mut tail = String::new();
                let kept: Vec<&str> = declarators
                    .iter()
                    .filter(|d| !wraps.iter().any(|w| w.name == d.name))
                    .map(|d| syntax::text(d.name, source))
                    .collect();
                if !kept.is_empty() {
                    tail.push_str(&format!("\nexport {{ {} }};", kept.join(", ")));
                }
                for declarator in wraps {
                    let name_text = syntax::text(declarator.name, source);
                    edits.push(rename(declarator.name, name_text));
                    tail.push_str(&format!("\n{}", shim::wrapper_export(name_text)));
                    functions.push(name_text.to_string());
                }
                edits.push(Edit::insert(statement.end_byte(), tail));
            }
            ExportKind::Clause { .. } | ExportKind::Other => {}
        }
    }

    if functions.is_empty() {
        return Ok(None);
    }

    if !syntax::has_bootstrap(root, source) {
        let block = shim::bootstrap(dialect, port);
        edits.push(match syntax::prologue_end(root) {
            Some(end) => Edit::insert(end, format!("\n{}", block.trim_end())),
            None => Edit::insert(0, block),
        });
    }

    let text = apply_edits(source, edits)?;
    syntax::parse(&text, dialect).map_err(InstrumentError::InvalidOutput)?;

    Ok(Some(Rewrite { text, functions }))
}

fn rename(name: tree_sitter::Node<'_>, text: &str) -> Edit {
    Edit::replace(name.start_byte(), name.end_byte(), shim::shadow_name(text))
}

#[cfg(test)]
#[path = "instrument_tests.rs"]
mod tests;
