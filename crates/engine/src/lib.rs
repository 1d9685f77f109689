// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iosnap engine: source instrumentation and snapshot verification

pub mod discover;
pub mod edit;
pub mod instrument;
pub mod registry;
pub mod restore;
pub mod shim;
pub mod syntax;
pub mod verify;

pub use discover::{discover, DiscoverError};
pub use instrument::{FileOutcome, FileReport, InjectReport, InstrumentError, Instrumenter};
pub use registry::ExportRegistry;
pub use restore::{CleanReport, RestoreError, RestoreFailure, RestoreReport, Restorer};
pub use shim::replay_harness;
pub use syntax::Dialect;
pub use verify::{
    CallProblem, CallReport, FunctionReport, FunctionStatus, VerificationReport, VerifyError,
    Verifier,
};
