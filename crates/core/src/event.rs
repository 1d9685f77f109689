// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture events recorded by the shim

use crate::value::SnapValue;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One recorded invocation of an instrumented function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    /// Exported name of the function
    pub fn_name: String,
    /// Arguments in call order
    #[serde(default)]
    pub args: Vec<SnapValue>,
    /// Returned (or resolved) value
    #[serde(default = "undefined")]
    pub result: SnapValue,
    /// When the call completed
    #[serde(with = "iso8601")]
    pub at: DateTime<Utc>,
}

fn undefined() -> SnapValue {
    SnapValue::Undefined
}

impl CaptureEvent {
    pub fn new(fn_name: impl Into<String>, args: Vec<SnapValue>, result: SnapValue) -> Self {
        Self {
            fn_name: fn_name.into(),
            args,
            result,
            at: Utc::now(),
        }
    }

    /// Parse one log line
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Encode as a single log line (no trailing newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Timestamps in the same shape `Date.prototype.toISOString` produces
mod iso8601 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
