// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON bodies exchanged with the Collector

use serde::{Deserialize, Serialize};

/// Reply to `/record` and `/stop`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResponse {
    pub is_recording: bool,
}

/// Reply to `/telemetry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TelemetryResponse {
    Captured,
    Ignored { reason: String },
}

impl TelemetryResponse {
    pub fn not_recording() -> Self {
        Self::Ignored {
            reason: "not_recording".to_string(),
        }
    }
}

/// Reply to `/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_recording: bool,
    /// Idle timeout in minutes
    pub timeout: u64,
    /// Seconds since startup
    pub uptime: f64,
    /// Events appended this session
    pub captured: u64,
    pub cors_origin: String,
    pub version: String,
}

/// Reply to `/shutdown`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub status: String,
}

impl ShutdownResponse {
    pub fn shutting_down() -> Self {
        Self {
            status: "shutting_down".to_string(),
        }
    }
}

/// Body of every non-2xx reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
