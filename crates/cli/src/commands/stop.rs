// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap stop`: end recording, stop the Collector, restore sources

use super::Project;
use crate::client::{daemon_stop, DaemonClient};
use crate::output::{divider, step};
use anyhow::Result;
use iosnap_core::config::parse_port;
use iosnap_engine::{RestoreReport, Restorer};
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct StopArgs {
    /// Port the collector listens on
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,
}

pub fn handle(project: &Project, args: StopArgs) -> Result<ExitCode> {
    let paths = &project.paths;
    let client = DaemonClient::new(args.port.unwrap_or(project.config.port));

    step(1, "Stopping recording...");
    match client.stop_recording() {
        Ok(_) => println!("Recording stopped."),
        Err(e) => println!("Collector not responding: {}", e),
    }

    step(2, "Stopping collector...");
    if daemon_stop(&client, paths)? {
        println!("Collector stopped.");
    } else {
        println!("Collector was not running.");
    }

    step(3, "Restoring original code...");
    let report = Restorer::new(project.store()).restore(None)?;
    print_restore(project, &report);

    if let Ok(meta) = std::fs::metadata(&paths.snapshot_log) {
        println!(
            "Snapshots preserved: {} ({} bytes)",
            paths.snapshot_log.display(),
            meta.len()
        );
    }

    divider();
    if report.is_clean() {
        println!("Original code restored. Run `iosnap test` after your changes.");
        divider();
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Some files could not be restored; backups were kept.");
        divider();
        Ok(ExitCode::FAILURE)
    }
}

/// One line per file, then a count
pub fn print_restore(project: &Project, report: &RestoreReport) {
    for path in &report.restored {
        println!("  restored  {}", project.display(path));
    }
    for path in &report.missing {
        println!("  missing   {} (no backup found)", project.display(path));
    }
    for failure in &report.failed {
        println!("  failed    {}: {}", project.display(&failure.path), failure.error);
    }
    match report.restored.len() {
        0 if report.failed.is_empty() => println!("Nothing to restore."),
        n => println!("Restored {} files", n),
    }
}
