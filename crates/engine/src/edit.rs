// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-span edits and atomic file replacement

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("edit {start}..{end} is out of bounds or splits a character")]
    OutOfBounds { start: usize, end: usize },
    #[error("edits overlap at byte {0}")]
    Overlap(usize),
    #[error("write failed for {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Replace `start..end` with `text`; an empty range is an insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, "")
    }
}

/// Apply non-overlapping edits to `source`.
///
/// Offsets refer to the original text. An insertion at the start of a
/// replaced range lands before the replacement text.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
    for edit in &edits {
        if edit.start > edit.end
            || edit.end > source.len()
            || !source.is_char_boundary(edit.start)
            || !source.is_char_boundary(edit.end)
        {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.end,
            });
        }
    }

    edits.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    for pair in edits.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(EditError::Overlap(pair[1].start));
        }
    }

    let mut out = String::with_capacity(source.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Replace `path` with `content` via a sibling temp file and rename
pub fn write_atomic(path: &Path, content: &str) -> Result<(), EditError> {
    let err = |source| EditError::Write {
        path: path.display().to_string(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(err)?;
    tmp.write_all(content.as_bytes()).map_err(err)?;
    tmp.as_file().sync_all().map_err(err)?;

    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(err)?;
    }

    tmp.persist(path).map_err(|e| err(e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod tests;
