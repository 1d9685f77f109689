// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collector client for CLI commands

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use iosnap_core::ProjectPaths;
use iosnap_daemon::{
    RecordingResponse, ShutdownResponse, StatusResponse, STARTUP_ERROR_PREFIX,
    STARTUP_MARKER_PREFIX,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for one HTTP request to the Collector
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("IOSNAP_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("IOSNAP_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("IOSNAP_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("IOSNAP_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running on port {0}")]
    DaemonNotRunning(u16),

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Daemon answered {path} with HTTP {status}")]
    Status { path: &'static str, status: u16 },

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP client for one Collector port
pub struct DaemonClient {
    port: u16,
    agent: ureq::Agent,
}

impl DaemonClient {
    pub fn new(port: u16) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout_ipc()))
            .build()
            .into();
        Self { port, agent }
    }

    pub fn status(&self) -> Result<StatusResponse, ClientError> {
        self.get("/status")
    }

    /// Start recording
    pub fn record(&self) -> Result<RecordingResponse, ClientError> {
        self.post("/record")
    }

    /// Stop recording; the daemon keeps running
    pub fn stop_recording(&self) -> Result<RecordingResponse, ClientError> {
        self.post("/stop")
    }

    pub fn shutdown(&self) -> Result<ShutdownResponse, ClientError> {
        self.post("/shutdown")
    }

    fn get<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ClientError> {
        let result = self.agent.get(&self.url(path)).call();
        self.read(path, result)
    }

    fn post<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ClientError> {
        let result = self.agent.post(&self.url(path)).send_empty();
        self.read(path, result)
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    fn read<T: DeserializeOwned>(
        &self,
        path: &'static str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<T, ClientError> {
        let mut response = result.map_err(|e| match e {
            ureq::Error::StatusCode(status) => ClientError::Status { path, status },
            ureq::Error::Io(_) | ureq::Error::ConnectionFailed => {
                ClientError::DaemonNotRunning(self.port)
            }
            other => ClientError::Http(other),
        })?;
        let body = response.body_mut().read_to_string()?;
        serde_json::from_str(&body).map_err(|_| ClientError::UnexpectedResponse(body))
    }
}

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background(
    paths: &ProjectPaths,
    port: u16,
    timeout_minutes: u64,
) -> Result<Child, ClientError> {
    let iosnapd = find_daemon_binary();
    debug!(binary = %iosnapd.display(), port, "starting daemon");

    Command::new(&iosnapd)
        .arg(&paths.root)
        .args(["--port", &port.to_string()])
        .args(["--timeout", &timeout_minutes.to_string()])
        .env(iosnap_core::paths::SESSION_DIR_ENV, &paths.session_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", iosnapd.display(), e)))
}

/// Wait until the daemon answers `/status`, watching for early exit
pub fn connect_with_retry(
    client: &DaemonClient,
    daemon_log: &Path,
    timeout: Duration,
    mut child: Child,
) -> Result<StatusResponse, ClientError> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        // Check if daemon process exited early (startup failure)
        if let Ok(Some(status)) = child.try_wait() {
            // Poll for startup error in log (filesystem may need to sync)
            let poll_start = Instant::now();
            while poll_start.elapsed() < timeout_exit() {
                if let Some(err) = read_startup_error(daemon_log) {
                    return Err(ClientError::DaemonStartFailed(err));
                }
                std::thread::sleep(poll_interval());
            }
            return Err(ClientError::DaemonStartFailed(format!(
                "exited with {}",
                status
            )));
        }

        match client.status() {
            Ok(status) => return Ok(status),
            Err(ClientError::DaemonNotRunning(_)) => std::thread::sleep(poll_interval()),
            Err(e) => return Err(wrap_with_startup_error(e, daemon_log)),
        }
    }

    Err(wrap_with_startup_error(
        ClientError::DaemonStartTimeout,
        daemon_log,
    ))
}

/// Stop the daemon (graceful first, then forceful).
/// Returns true if a daemon was stopped, false if none was running.
pub fn daemon_stop(client: &DaemonClient, paths: &ProjectPaths) -> Result<bool, ClientError> {
    let shutdown = client.shutdown();
    let pid = read_daemon_pid(&paths.pid_path).filter(|pid| process_exists(*pid));

    match (&shutdown, pid) {
        (Err(ClientError::DaemonNotRunning(_)), None) => {
            cleanup_stale_pid(&paths.pid_path);
            return Ok(false);
        }
        (Err(e), _) => debug!(error = %e, "graceful shutdown failed"),
        (Ok(_), _) => {}
    }

    if let Some(pid) = pid {
        if shutdown.is_ok() {
            wait_for_exit(pid, timeout_exit());
        }
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit());
        }
    }

    cleanup_stale_pid(&paths.pid_path);
    Ok(true)
}

/// Wait for a process to exit
fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(poll_interval());
    }
    false
}

/// Find the iosnapd binary
fn find_daemon_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("IOSNAP_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("iosnapd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Running from cargo (development)
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let dev_path = PathBuf::from(manifest_dir)
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("target/debug/iosnapd"));
        if let Some(path) = dev_path.filter(|p| p.exists()) {
            return path;
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("iosnapd")
}

/// Remove a PID file left behind by a daemon that is gone
fn cleanup_stale_pid(pid_path: &Path) {
    if pid_path.exists() {
        let _ = std::fs::remove_file(pid_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(pid_path: &Path) -> Option<u32> {
    std::fs::read_to_string(pid_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// PID of a live daemon for this session; removes a stale PID file
pub fn live_daemon_pid(pid_path: &Path) -> Option<u32> {
    let pid = read_daemon_pid(pid_path)?;
    if process_exists(pid) {
        return Some(pid);
    }
    cleanup_stale_pid(pid_path);
    None
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // kill -0 checks for the process without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read the daemon log from the last startup marker, looking for the
/// startup failure line
pub fn read_startup_error(daemon_log: &Path) -> Option<String> {
    let content = std::fs::read_to_string(daemon_log).ok()?;

    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter_map(|line| line.strip_prefix(STARTUP_ERROR_PREFIX))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

/// Wrap an error with startup log info if available
fn wrap_with_startup_error(err: ClientError, daemon_log: &Path) -> ClientError {
    // Don't double-wrap
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(daemon_log) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
