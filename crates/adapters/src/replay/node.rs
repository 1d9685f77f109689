// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replays through a Node.js child process
//!
//! One process per batch. The harness script reads a JSON request from
//! stdin, imports the module, invokes the export for every argument list
//! and prints a single result line prefixed with [`RESULT_SENTINEL`]. Any
//! other stdout from the module under test is ignored.

use super::{CallOutcome, ReplayError, Replayer};
use async_trait::async_trait;
use iosnap_core::SnapValue;
use serde_json::{json, Value as Json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Prefix of the harness's result line
pub const RESULT_SENTINEL: &str = "__IOSNAP_RESULT__ ";

#[derive(Debug, Clone)]
pub struct NodeReplayerConfig {
    /// Node.js executable
    pub node: String,
    /// Arguments placed before the harness (loaders, flags)
    pub node_args: Vec<String>,
    /// Working directory for the child (the project root)
    pub cwd: PathBuf,
    /// Bound on one batch
    pub timeout: Duration,
}

/// Node.js-backed replayer
#[derive(Clone)]
pub struct NodeReplayer {
    config: Arc<NodeReplayerConfig>,
    harness: Arc<str>,
}

impl NodeReplayer {
    /// `harness` is the ES module source run with `--input-type=module -e`
    pub fn new(config: NodeReplayerConfig, harness: impl Into<Arc<str>>) -> Self {
        Self {
            config: Arc::new(config),
            harness: harness.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.node);
        cmd.args(&self.config.node_args)
            .arg("--input-type=module")
            .arg("-e")
            .arg(&*self.harness)
            .current_dir(&self.config.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Request body sent to the harness on stdin
pub(crate) fn encode_request(module: &Path, name: &str, calls: &[Vec<SnapValue>]) -> Json {
    let calls: Vec<Json> = calls
        .iter()
        .map(|args| Json::Array(args.iter().map(SnapValue::to_json).collect()))
        .collect();
    json!({
        "module": module.to_string_lossy(),
        "export": name,
        "calls": calls,
    })
}

/// Decode the harness's result line out of its full stdout
pub(crate) fn decode_response(
    stdout: &str,
    module: &Path,
    name: &str,
    expected: usize,
) -> Result<Vec<CallOutcome>, ReplayError> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESULT_SENTINEL))
        .ok_or_else(|| ReplayError::Protocol("harness printed no result".to_string()))?;

    let response: Json =
        serde_json::from_str(line).map_err(|e| ReplayError::Protocol(e.to_string()))?;

    let error_text = || {
        response
            .get("error")
            .and_then(Json::as_str)
            .unwrap_or("unknown error")
            .to_string()
    };

    match response.get("stage").and_then(Json::as_str) {
        Some("load") => {
            return Err(ReplayError::LoadFailed {
                module: module.to_path_buf(),
                reason: error_text(),
            })
        }
        Some("export") => {
            return Err(ReplayError::ExportMissing {
                module: module.to_path_buf(),
                name: name.to_string(),
            })
        }
        _ => {}
    }

    let Some(Json::Array(results)) = response.get("outcomes") else {
        return Err(ReplayError::Protocol("missing outcomes".to_string()));
    };
    if results.len() != expected {
        return Err(ReplayError::Protocol(format!(
            "expected {} outcomes, got {}",
            expected,
            results.len()
        )));
    }

    results
        .iter()
        .map(|outcome| {
            if outcome.get("ok").and_then(Json::as_bool) == Some(true) {
                let value = outcome.get("value").cloned().unwrap_or(Json::Null);
                SnapValue::from_json(value)
                    .map(CallOutcome::Returned)
                    .map_err(|e| ReplayError::Protocol(e.to_string()))
            } else {
                let message = outcome
                    .get("error")
                    .and_then(Json::as_str)
                    .unwrap_or("unknown error");
                Ok(CallOutcome::Threw(message.to_string()))
            }
        })
        .collect()
}

#[async_trait]
impl Replayer for NodeReplayer {
    async fn replay(
        &self,
        module: &Path,
        name: &str,
        calls: &[Vec<SnapValue>],
    ) -> Result<Vec<CallOutcome>, ReplayError> {
        let request = encode_request(module, name, calls).to_string();

        let mut child = self
            .command()
            .spawn()
            .map_err(|e| ReplayError::Spawn(format!("{}: {}", self.config.node, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.as_bytes())
                .await
                .map_err(|e| ReplayError::Spawn(e.to_string()))?;
            // Dropping stdin closes it so the harness sees EOF
        }

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| ReplayError::Timeout(self.config.timeout))?
            .map_err(|e| ReplayError::Spawn(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match decode_response(&stdout, module, name, calls.len()) {
            Err(ReplayError::Protocol(reason)) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let last = stderr.lines().rev().find(|l| !l.trim().is_empty());
                Err(ReplayError::LoadFailed {
                    module: module.to_path_buf(),
                    reason: last.map(str::to_string).unwrap_or(reason),
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
