//! Behavioral specifications for the iosnap CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, exit codes, and the files left on disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// instrument/
#[path = "specs/instrument/idempotence.rs"]
mod instrument_idempotence;
#[path = "specs/instrument/roundtrip.rs"]
mod instrument_roundtrip;

// verify/
#[path = "specs/verify/preconditions.rs"]
mod verify_preconditions;
