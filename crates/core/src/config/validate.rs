// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Option validation shared by the CLI and the daemon

use super::ConfigError;

/// Parse a TCP port in 1..=65535
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

/// Parse an idle timeout of at least one minute
pub fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(minutes) if minutes >= 1 => Ok(minutes),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

/// Reject blank file-set patterns
pub fn validate_pattern(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyPattern);
    }
    Ok(trimmed.to_string())
}
