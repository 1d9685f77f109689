// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! iosnap Collector daemon (iosnapd)
//!
//! Background process that receives capture events over HTTP on localhost.

use std::path::PathBuf;

use clap::Parser;
use iosnap_core::config::{parse_port, parse_timeout};
use iosnap_daemon::lifecycle::{self, DaemonConfig, LifecycleError};
use iosnap_daemon::{STARTUP_ERROR_PREFIX, STARTUP_MARKER_PREFIX};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "iosnapd", version, about = "iosnap Collector daemon")]
struct Args {
    /// Project root (defaults to the current directory)
    project_root: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, value_parser = parse_port)]
    port: Option<u16>,

    /// Idle timeout in minutes
    #[arg(short, long, value_parser = parse_timeout)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let project_root = match args.project_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    // Load configuration
    let config = DaemonConfig::for_project(&project_root, args.port, args.timeout)?;

    // Write startup marker to log (before tracing setup, so CLI can find it)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting iosnapd for project: {}", config.paths.root.display());

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!("Daemon ready, listening on 127.0.0.1:{}", config.port);

    // Signal ready for parent process (CLI waiting for startup)
    println!("READY");

    let reason = daemon.run().await?;
    info!(?reason, "Daemon stopped");
    Ok(())
}

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &DaemonConfig) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(&config.paths.session_dir)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.daemon_log)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
/// This ensures the error is visible to the CLI even if the process exits quickly.
fn write_startup_error(config: &DaemonConfig, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.daemon_log)
    else {
        return;
    };
    let _ = writeln!(file, "{}{}", STARTUP_ERROR_PREFIX, error);
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender =
        tracing_appender::rolling::never(&config.paths.session_dir, "daemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}
