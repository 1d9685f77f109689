// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only snapshot log, one capture event per line

use iosnap_core::CaptureEvent;
use serde_json::Value as Json;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in snapshot log operations
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writer side of the snapshot log
pub struct SnapshotLog {
    file: File,
    appended: u64,
}

/// Result of reading a log back
#[derive(Debug, Default)]
pub struct LogRead {
    /// Events in log order
    pub events: Vec<CaptureEvent>,
    /// Lines that could not be decoded
    pub skipped: usize,
}

impl SnapshotLog {
    /// Open or create the log for appending
    pub fn open(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file, appended: 0 })
    }

    /// Empty the log, creating it if needed
    pub fn truncate(path: &Path) -> Result<(), LogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        File::create(path)?;
        Ok(())
    }

    /// Append a capture event
    pub fn append(&mut self, event: &CaptureEvent) -> Result<u64, LogError> {
        let line = event.to_line()?;
        self.write_line(line)
    }

    /// Append an already-decoded JSON record, re-encoded compactly
    pub fn append_json(&mut self, record: &Json) -> Result<u64, LogError> {
        let line = serde_json::to_string(record)?;
        self.write_line(line)
    }

    /// Number of records appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    fn write_line(&mut self, mut line: String) -> Result<u64, LogError> {
        line.push('\n');
        // One write per record keeps lines whole under O_APPEND
        self.file.write_all(line.as_bytes())?;
        self.file.sync_data()?;
        self.appended += 1;
        Ok(self.appended)
    }

    /// Read every event; `Ok(None)` when the log does not exist.
    ///
    /// Blank lines are ignored. Corrupt lines are skipped with a warning.
    pub fn read(path: &Path) -> Result<Option<LogRead>, LogError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut read = LogRead::default();

        for (index, raw) in reader.split(b'\n').enumerate() {
            let line = match String::from_utf8(raw?) {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping non-UTF-8 snapshot record");
                    read.skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match CaptureEvent::from_line(&line) {
                Ok(event) => read.events.push(event),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping corrupt snapshot record");
                    read.skipped += 1;
                }
            }
        }

        Ok(Some(read))
    }
}

/// Group events by function name, in first-seen order
pub fn group_by_function(events: Vec<CaptureEvent>) -> Vec<(String, Vec<CaptureEvent>)> {
    let mut groups: Vec<(String, Vec<CaptureEvent>)> = Vec::new();
    for event in events {
        match groups.iter_mut().find(|(name, _)| *name == event.fn_name) {
            Some((_, records)) => records.push(event),
            None => groups.push((event.fn_name.clone(), vec![event])),
        }
    }
    groups
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
