// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! iosnap - capture real calls, refactor, replay them

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{clean, inject, record, status, stop, verify, Project};
use error::SnapError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "iosnap",
    version,
    about = "Capture and replay function behavior for zero-regression refactoring"
)]
struct Cli {
    /// Project root directory (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap exported functions with the capture shim
    Inject(inject::InjectArgs),
    /// Instrument, start the collector, and begin recording
    Record(record::RecordArgs),
    /// Stop recording, stop the collector, and restore original code
    Stop(stop::StopArgs),
    /// Replay captured calls against the current code
    Test(verify::TestArgs),
    /// Restore original files and delete snapshots
    Clean(clean::CleanArgs),
    /// Show collector status
    Status(status::StatusArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<SnapError>() {
                Some(err) => eprint!("{}", err),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let project = Project::open(cli.project)?;

    match cli.command {
        Commands::Inject(args) => inject::handle(&project, args),
        Commands::Record(args) => record::handle(&project, args),
        Commands::Stop(args) => stop::handle(&project, args),
        Commands::Test(args) => verify::handle(&project, args).await,
        Commands::Clean(args) => clean::handle(&project, args),
        Commands::Status(args) => status::handle(&project, args),
    }
}

/// Diagnostics go to stderr so stdout stays parseable
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("IOSNAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
