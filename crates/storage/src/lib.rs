// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! On-disk state: the snapshot log and source backups

pub mod backup;
pub mod log;

pub use backup::{BackupError, BackupPaths, BackupStore, RestoreSource};
pub use log::{group_by_function, LogError, LogRead, SnapshotLog};
