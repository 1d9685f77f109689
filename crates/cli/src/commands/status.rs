// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap status`: report on the Collector

use super::Project;
use crate::client::{ClientError, DaemonClient};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use iosnap_core::config::parse_port;
use iosnap_daemon::StatusResponse;
use serde::Serialize;
use std::fmt;
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Port the collector listens on
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub fn handle(project: &Project, args: StatusArgs) -> Result<ExitCode> {
    let port = args.port.unwrap_or(project.config.port);
    let status = match DaemonClient::new(port).status() {
        Ok(status) => Some(status),
        Err(ClientError::DaemonNotRunning(_)) => None,
        Err(e) => return Err(e.into()),
    };
    output::print(&StatusView::new(port, status.as_ref()), args.format);
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView<'a> {
    running: bool,
    port: u16,
    #[serde(flatten)]
    status: Option<&'a StatusResponse>,
}

impl<'a> StatusView<'a> {
    pub fn new(port: u16, status: Option<&'a StatusResponse>) -> Self {
        Self {
            running: status.is_some(),
            port,
            status,
        }
    }
}

impl fmt::Display for StatusView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(status) = self.status else {
            return writeln!(f, "Daemon not running (port {})", self.port);
        };
        writeln!(f, "Status: running")?;
        writeln!(f, "Port: {}", self.port)?;
        writeln!(
            f,
            "Recording: {}",
            if status.is_recording { "yes" } else { "no" }
        )?;
        writeln!(f, "Captured: {}", status.captured)?;
        writeln!(f, "Uptime: {}", format_uptime(status.uptime))?;
        writeln!(f, "Idle timeout: {}m", status.timeout)?;
        writeln!(f, "CORS origin: {}", status.cors_origin)?;
        writeln!(f, "Version: {}", status.version)
    }
}

fn format_uptime(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, _) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
