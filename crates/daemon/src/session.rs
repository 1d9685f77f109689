// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording session state owned by the Collector

use iosnap_core::Clock;
use iosnap_storage::{LogError, SnapshotLog};
use serde_json::Value as Json;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What happened to one telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Appended; carries the running total for this session
    Captured(u64),
    /// Dropped because recording is off
    Ignored,
}

/// Recording flag, activity timestamps and the open snapshot log
pub struct Session<C: Clock> {
    clock: C,
    log_path: PathBuf,
    log: Option<SnapshotLog>,
    recording: bool,
    started_at: Instant,
    last_activity_at: Instant,
    captured: u64,
}

impl<C: Clock> Session<C> {
    pub fn new(clock: C, log_path: PathBuf) -> Self {
        let now = clock.now();
        Self {
            clock,
            log_path,
            log: None,
            recording: false,
            started_at: now,
            last_activity_at: now,
            captured: 0,
        }
    }

    pub fn start_recording(&mut self) {
        if !self.recording {
            info!(log = %self.log_path.display(), "recording started");
        }
        self.recording = true;
        self.touch();
    }

    /// Turn recording off and release the log handle
    pub fn stop_recording(&mut self) {
        if self.recording {
            info!(captured = self.captured, "recording stopped");
        }
        self.recording = false;
        self.log = None;
    }

    /// Append `record` if recording, re-encoded as one compact line
    pub fn capture(&mut self, record: &Json) -> Result<Capture, LogError> {
        if !self.recording {
            return Ok(Capture::Ignored);
        }
        if self.log.is_none() {
            self.log = Some(SnapshotLog::open(&self.log_path)?);
        }
        if let Some(log) = self.log.as_mut() {
            log.append_json(record)?;
        }
        self.captured += 1;
        self.touch();
        debug!(captured = self.captured, "captured event");
        Ok(Capture::Captured(self.captured))
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Events appended since the daemon started
    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn uptime(&self) -> Duration {
        self.clock.since(self.started_at)
    }

    pub fn idle_for(&self) -> Duration {
        self.clock.since(self.last_activity_at)
    }

    /// True once `timeout` has passed without activity
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.idle_for() >= timeout
    }

    fn touch(&mut self) {
        self.last_activity_at = self.clock.now();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
