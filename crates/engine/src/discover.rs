// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving a file-set pattern to candidate source files

use crate::syntax::Dialect;
use glob::{MatchOptions, Pattern};
use iosnap_core::paths::{BACKUP_EXT, LOCAL_BACKUP_DIR};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directories never searched
const SKIP_DIRS: &[&str] = &["node_modules", ".git", LOCAL_BACKUP_DIR];

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("no files matched pattern '{0}'")]
    NoFilesMatched(String),
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Expand `{a,b}` alternatives (nesting allowed) into plain glob patterns
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        let at = open + i;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(at);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(at),
            _ => {}
        }
    }

    // Unbalanced braces are left for glob to treat literally
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(&splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let alternative = &pattern[w[0] + 1..w[1]];
            expand_braces(&format!("{}{}{}", prefix, alternative, suffix))
        })
        .collect()
}

/// Sorted, de-duplicated source files under `root` matching `pattern`.
///
/// The pattern is relative to `root`. Backup artifacts, declaration files,
/// files of unknown dialect and the skipped directories never match.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let pattern_path = Path::new(pattern.strip_prefix("./").unwrap_or(pattern));
    let relative = pattern_path
        .strip_prefix(root)
        .unwrap_or(pattern_path)
        .to_string_lossy();
    let relative = relative.trim_start_matches('/');

    let patterns = expand_braces(relative)
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DiscoverError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    walk(root, root, &mut |rel, abs| {
        if is_candidate(rel) && patterns.iter().any(|p| p.matches_path_with(rel, options)) {
            files.push(abs.to_path_buf());
        }
    })?;

    files.sort();
    files.dedup();
    debug!(pattern, matched = files.len(), "discovered files");

    if files.is_empty() {
        return Err(DiscoverError::NoFilesMatched(pattern.to_string()));
    }
    Ok(files)
}

fn is_candidate(rel: &Path) -> bool {
    let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.ends_with(BACKUP_EXT)
        && !name.ends_with(".d.ts")
        && Dialect::from_path(rel).is_some()
}

fn walk(
    root: &Path,
    dir: &Path,
    visit: &mut dyn FnMut(&Path, &Path),
) -> Result<(), DiscoverError> {
    let io_err = |source| DiscoverError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            let skip = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIP_DIRS.contains(&name));
            if !skip {
                walk(root, &path, visit)?;
            }
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                visit(rel, &path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
