// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Each error says what went wrong, why it might have happened, and how to
//! fix it.

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct SnapError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SnapError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for SnapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Builders for the failures users actually hit.
impl SnapError {
    /// Verification found nothing to replay
    pub fn no_snapshots(log_path: &Path) -> Self {
        SnapError::new("No snapshots to verify")
            .with_context(format!("{} is missing or empty", log_path.display()))
            .with_suggestion("Capture calls first: iosnap record, exercise your app, then iosnap stop")
    }

    /// A file-set pattern resolved to nothing
    pub fn no_files_matched(pattern: &str) -> Self {
        SnapError::new(format!("No files matched '{}'", pattern))
            .with_context("node_modules and backup directories are never searched")
            .with_suggestion("Check the pattern relative to the project root, e.g. 'src/**/*.ts'")
            .with_suggestion("Pass --project if you are not in the project root")
    }

    /// `record` found a session already in progress
    pub fn already_recording(pid: Option<u32>, port: u16) -> Self {
        let holder = match pid {
            Some(pid) => format!("A daemon is active (PID: {}, port {})", pid, port),
            None => format!("A daemon is answering on port {}", port),
        };
        SnapError::new("io-snapshot is already running")
            .with_context(holder)
            .with_suggestion("Stop the current session first: iosnap stop")
    }

    /// The daemon never became reachable
    pub fn daemon_start_failed(reason: impl Into<String>) -> Self {
        SnapError::new("Failed to start the collector daemon")
            .with_context(reason)
            .with_suggestion("Choose another port: iosnap record --port <port>")
            .with_suggestion("Set IOSNAP_DAEMON_BINARY if iosnapd is not next to iosnap")
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
