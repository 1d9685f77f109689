// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap inject`: wrap exported functions with the capture shim

use super::Project;
use crate::error::SnapError;
use anyhow::Result;
use iosnap_core::config::{validate_pattern, DEFAULT_PATTERN};
use iosnap_engine::{DiscoverError, FileOutcome, InjectReport, InstrumentError, Instrumenter};
use std::fmt;
use std::path::Path;
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct InjectArgs {
    /// Files to instrument (glob relative to the project, `{a,b}` allowed)
    #[arg(value_parser = validate_pattern)]
    pub target: Option<String>,

    /// Re-instrument files that already carry the shim
    #[arg(short, long)]
    pub force: bool,
}

pub fn handle(project: &Project, args: InjectArgs) -> Result<ExitCode> {
    let pattern = args.target.as_deref().unwrap_or(DEFAULT_PATTERN);
    let report = run(project, pattern, project.config.port, args.force)?;
    print!("{}", Summary::new(&project.paths.root, &report));
    Ok(exit_code(&report))
}

/// Instrument `pattern` so captures report to `port`
pub fn run(project: &Project, pattern: &str, port: u16, force: bool) -> Result<InjectReport> {
    Instrumenter::new(project.store(), port)
        .inject(pattern, force)
        .map_err(|e| match e {
            InstrumentError::Discover(DiscoverError::NoFilesMatched(pattern)) => {
                SnapError::no_files_matched(&pattern).into()
            }
            other => anyhow::Error::new(other),
        })
}

pub fn exit_code(report: &InjectReport) -> ExitCode {
    if report.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Per-file lines and a closing summary
pub struct Summary<'a> {
    root: &'a Path,
    report: &'a InjectReport,
}

impl<'a> Summary<'a> {
    pub fn new(root: &'a Path, report: &'a InjectReport) -> Self {
        Self { root, report }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.report.files {
            let path = file.path.strip_prefix(self.root).unwrap_or(&file.path);
            match &file.outcome {
                FileOutcome::Injected { functions } => writeln!(
                    f,
                    "  injected  {} ({})",
                    path.display(),
                    functions.join(", ")
                )?,
                FileOutcome::AlreadyInjected => writeln!(
                    f,
                    "  skipped   {} (already instrumented, use --force to redo)",
                    path.display()
                )?,
                // Files without exported functions are only counted
                FileOutcome::NoExports => {}
                FileOutcome::Failed { error } => {
                    writeln!(f, "  failed    {}: {}", path.display(), error)?
                }
            }
        }

        let report = self.report;
        let untouched =
            report.files.len() - report.injected() - report.already_injected() - report.failed();
        write!(
            f,
            "Instrumented {} functions in {} files",
            report.functions(),
            report.injected()
        )?;
        let mut notes = Vec::new();
        if report.already_injected() > 0 {
            notes.push(format!("{} already instrumented", report.already_injected()));
        }
        if untouched > 0 {
            notes.push(format!("{} without exported functions", untouched));
        }
        if report.failed() > 0 {
            notes.push(format!("{} failed", report.failed()));
        }
        if !notes.is_empty() {
            write!(f, " ({})", notes.join(", "))?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;
