// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iosnap Collector daemon
//!
//! Receives capture events from instrumented programs over HTTP and appends
//! them to the project's snapshot log while recording is on.

pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod session;

pub use lifecycle::{DaemonConfig, LifecycleError, ShutdownReason};
pub use protocol::{
    ErrorResponse, RecordingResponse, ShutdownResponse, StatusResponse, TelemetryResponse,
};
pub use server::{router, Collector, CollectorSettings};
pub use session::{Capture, Session};

/// Startup marker prefix written to the log before anything else.
/// Full format: "--- iosnapd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- iosnapd: starting (pid: ";

/// Prefix of the synchronous startup-failure line
pub const STARTUP_ERROR_PREFIX: &str = "ERROR Failed to start daemon: ";
