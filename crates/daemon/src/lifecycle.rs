// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, serving, idle timeout, shutdown.

use std::fs::File;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use iosnap_core::{Clock, Config, PathError, ProjectPaths, SystemClock};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::server::{router, Collector, CollectorSettings};
use crate::session::Session;

/// How often the idle watcher looks at the session
pub const IDLE_TICK: Duration = Duration::from_secs(30);

/// Upper bound for in-flight requests to finish after shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub paths: ProjectPaths,
    pub port: u16,
    /// Idle timeout in minutes
    pub timeout_minutes: u64,
    pub cors_origin: String,
    pub idle_tick: Duration,
}

impl DaemonConfig {
    /// Resolve configuration for a project; explicit values win over the
    /// config file and environment
    pub fn for_project(
        project_root: &Path,
        port: Option<u16>,
        timeout_minutes: Option<u64>,
    ) -> Result<Self, LifecycleError> {
        let paths = ProjectPaths::for_project(project_root)?;
        let config = Config::load(&paths.root);
        Ok(Self {
            port: port.unwrap_or(config.port),
            timeout_minutes: timeout_minutes.unwrap_or(config.timeout),
            cors_origin: config.cors.origin,
            idle_tick: IDLE_TICK,
            paths,
        })
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Paths(#[from] PathError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Port {0} is already in use or unavailable: {1}")]
    BindFailed(u16, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the daemon stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Requested,
    IdleTimeout,
    Signal(&'static str),
}

/// A started daemon, ready to serve
pub struct Daemon {
    pub config: DaemonConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    listener: TcpListener,
    pub collector: Arc<Collector<SystemClock>>,
}

/// Start the daemon: lock, then bind
pub async fn startup(config: &DaemonConfig) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.paths.session_dir)?;

    // Lock FIRST; a failure here means another daemon owns the PID file
    let lock_file = acquire_lock(&config.paths.pid_path)?;

    match bind(config).await {
        Ok(listener) => {
            let session = Session::new(SystemClock, config.paths.snapshot_log.clone());
            let collector = Collector::new(
                session,
                CollectorSettings {
                    timeout_minutes: config.timeout_minutes,
                    cors_origin: config.cors_origin.clone(),
                },
            );
            info!(
                project = %config.paths.root.display(),
                port = config.port,
                timeout_minutes = config.timeout_minutes,
                "daemon started"
            );
            Ok(Daemon {
                config: config.clone(),
                lock_file,
                listener,
                collector,
            })
        }
        Err(e) => {
            remove_pid_file(&config.paths.pid_path);
            Err(e)
        }
    }
}

fn acquire_lock(pid_path: &Path) -> Result<File, LifecycleError> {
    // Open without truncating so a live daemon's PID survives a failed attempt
    let mut lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    lock_file.sync_all()?;
    Ok(lock_file)
}

async fn bind(config: &DaemonConfig) -> Result<TcpListener, LifecycleError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.port, e))
}

impl Daemon {
    /// Address actually bound (differs from the config when port 0 is used)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `/shutdown`, a signal, or the idle timeout
    pub async fn run(self) -> Result<ShutdownReason, LifecycleError> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let app = router(Arc::clone(&self.collector));
        let listener = self.listener;
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        let idle_timeout = self.config.idle_timeout();
        let reason = tokio::select! {
            _ = self.collector.shutdown_requested() => ShutdownReason::Requested,
            _ = watch_idle(&self.collector, self.config.idle_tick, idle_timeout) => {
                warn!(
                    timeout_minutes = self.config.timeout_minutes,
                    "shutting down after inactivity"
                );
                ShutdownReason::IdleTimeout
            }
            _ = sigterm.recv() => ShutdownReason::Signal("SIGTERM"),
            _ = sigint.recv() => ShutdownReason::Signal("SIGINT"),
        };
        info!(?reason, "shutting down");

        let _ = stop_tx.send(true);
        match tokio::time::timeout(DRAIN_TIMEOUT, server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(error = %e, "server exited with error"),
            Ok(Err(e)) => warn!(error = %e, "server task failed"),
            Err(_) => warn!("in-flight requests did not finish in time"),
        }

        self.collector.session().stop_recording();
        remove_pid_file(&self.config.paths.pid_path);
        info!("daemon shutdown complete");
        Ok(reason)
    }
}

/// Resolves once the session has been idle for `timeout`, checking every
/// `tick`
pub async fn watch_idle<C: Clock>(collector: &Collector<C>, tick: Duration, timeout: Duration) {
    loop {
        tokio::time::sleep(tick).await;
        if collector.session().is_idle(timeout) {
            return;
        }
    }
}

fn remove_pid_file(pid_path: &Path) {
    if let Err(e) = std::fs::remove_file(pid_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %pid_path.display(), error = %e, "failed to remove PID file");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
