// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! iosnap-core: shared model for capture-and-replay testing
//!
//! This crate provides:
//! - The captured value model and its tagged-JSON encoding
//! - Capture events as written to the snapshot log
//! - The structural differ used to detect drift
//! - Project paths, configuration and a testable clock

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod diff;
pub mod event;
pub mod paths;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError};
pub use diff::{diff, patch, Change, ChangeKind, PatchError, PathSegment};
pub use event::CaptureEvent;
pub use paths::{PathError, ProjectPaths};
pub use value::{SnapValue, ValueError};
