// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap record`: instrument, start the Collector, begin recording

use super::{inject, Project};
use crate::client::{
    connect_with_retry, live_daemon_pid, start_daemon_background, timeout_connect, DaemonClient,
};
use crate::error::SnapError;
use crate::output::{divider, step};
use anyhow::Result;
use iosnap_core::config::{parse_port, parse_timeout, validate_pattern, DEFAULT_PATTERN};
use iosnap_storage::SnapshotLog;
use std::process::ExitCode;

const WORKFLOW: &[(&str, &str)] = &[
    ("iosnap record", "Instrument code and start the background collector"),
    ("npm run dev", "Start your app (the collector must be running)"),
    ("use the app", "Exercise it to capture real-world calls"),
    ("iosnap stop", "Stop recording and restore your original code"),
    ("refactor", "Change the code"),
    ("iosnap test", "Replay the captured calls against the new code"),
];

#[derive(clap::Args)]
pub struct RecordArgs {
    /// Files to instrument (glob relative to the project, `{a,b}` allowed)
    #[arg(value_parser = validate_pattern)]
    pub target: Option<String>,

    /// Port for the collector
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,

    /// Shut the collector down after this many idle minutes
    #[arg(short, long, value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Re-instrument files that already carry the shim
    #[arg(short, long)]
    pub force: bool,
}

pub fn handle(project: &Project, args: RecordArgs) -> Result<ExitCode> {
    let paths = &project.paths;
    let port = args.port.unwrap_or(project.config.port);
    let timeout = args.timeout.unwrap_or(project.config.timeout);
    let client = DaemonClient::new(port);

    if let Some(pid) = live_daemon_pid(&paths.pid_path) {
        return Err(SnapError::already_recording(Some(pid), port).into());
    }
    if client.status().is_ok() {
        return Err(SnapError::already_recording(None, port).into());
    }

    divider();
    println!("Run this command FIRST, THEN start your app.");
    for (command, what) in WORKFLOW {
        println!("  {:<14} {}", command, what);
    }
    divider();

    step(1, "Instrumenting files...");
    let pattern = args.target.as_deref().unwrap_or(DEFAULT_PATTERN);
    let report = inject::run(project, pattern, port, args.force)?;
    print!("{}", inject::Summary::new(&paths.root, &report));

    step(2, "Starting collector...");
    let child = start_daemon_background(paths, port, timeout).map_err(|e| {
        SnapError::daemon_start_failed(e.to_string())
            .with_suggestion("Restore your files: iosnap clean")
    })?;
    let pid = child.id();
    connect_with_retry(&client, &paths.daemon_log, timeout_connect(), child).map_err(|e| {
        SnapError::daemon_start_failed(e.to_string())
            .with_suggestion("Restore your files: iosnap clean")
    })?;
    println!("Collector started on port {} (PID: {})", port, pid);

    // Only now is a new session certain; earlier failures keep the old log
    SnapshotLog::truncate(&paths.snapshot_log)?;
    println!("Cleared previous snapshots for a fresh session.");

    step(3, "Starting recording...");
    client.record().map_err(|e| {
        SnapError::new("Failed to start recording")
            .with_context(e.to_string())
            .with_suggestion("Stop the session and retry: iosnap stop")
    })?;
    println!("Recording active.");
    println!("Snapshots will be saved to: {}", paths.snapshot_log.display());

    divider();
    println!("NOW START YOUR APP (e.g. npm run dev) and use it.");
    println!("Run `iosnap stop` when done to restore the original code.");
    divider();

    Ok(inject::exit_code(&report))
}
