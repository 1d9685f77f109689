// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap test`: replay captured calls against the current code

use super::Project;
use crate::error::SnapError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use iosnap_adapters::{NodeReplayer, NodeReplayerConfig, TracedReplayer};
use iosnap_core::config::validate_pattern;
use iosnap_engine::{
    replay_harness, CallProblem, DiscoverError, FunctionReport, FunctionStatus,
    VerificationReport, VerifyError, Verifier,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

#[derive(clap::Args)]
pub struct TestArgs {
    /// Files to search for recorded functions (glob, `{a,b}` allowed)
    #[arg(value_parser = validate_pattern)]
    pub target: Option<String>,

    /// Verify only these functions (repeat or separate with commas)
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    pub only: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub async fn handle(project: &Project, args: TestArgs) -> Result<ExitCode> {
    let replay = &project.config.replay;
    let replayer = TracedReplayer::new(NodeReplayer::new(
        NodeReplayerConfig {
            node: replay.node.clone(),
            node_args: replay.node_args.clone(),
            cwd: project.paths.root.clone(),
            timeout: Duration::from_secs(replay.timeout_secs),
        },
        replay_harness(),
    ));

    let report = Verifier::new(project.paths.clone(), replayer)
        .verify(args.target.as_deref(), &args.only)
        .await
        .map_err(|e| match e {
            VerifyError::NoSnapshots(path) => SnapError::no_snapshots(&path).into(),
            VerifyError::Discover(DiscoverError::NoFilesMatched(pattern)) => {
                SnapError::no_files_matched(&pattern).into()
            }
            other => anyhow::Error::new(other),
        })?;

    output::print(&ReportView::new(&project.paths.root, &report), args.format);
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView<'a> {
    passed: bool,
    #[serde(flatten)]
    report: &'a VerificationReport,
    #[serde(skip)]
    root: &'a Path,
}

impl<'a> ReportView<'a> {
    pub fn new(root: &'a Path, report: &'a VerificationReport) -> Self {
        Self {
            passed: report.passed(),
            report,
            root,
        }
    }

    fn write_function(&self, f: &mut fmt::Formatter<'_>, function: &FunctionReport) -> fmt::Result {
        let calls = plural(function.total, "call");
        match &function.status {
            FunctionStatus::Passed => writeln!(f, "PASS     {} ({})", function.name, calls)?,
            FunctionStatus::Drift => writeln!(
                f,
                "DRIFT    {} ({} of {} failed)",
                function.name, function.failed, calls
            )?,
            FunctionStatus::NotFound => writeln!(
                f,
                "MISSING  {} ({}): not exported by any matching file",
                function.name, calls
            )?,
            FunctionStatus::Skipped => {
                writeln!(f, "SKIP     {}: no recorded calls", function.name)?
            }
            FunctionStatus::Failed { reason } => {
                writeln!(f, "FAIL     {} ({}): {}", function.name, calls, reason)?
            }
        }
        if let Some(module) = &function.module {
            if !function.calls.is_empty() {
                let module = module.strip_prefix(self.root).unwrap_or(module);
                writeln!(f, "         in {}", module.display())?;
            }
        }
        for call in &function.calls {
            let args: Vec<String> = call.args.iter().map(ToString::to_string).collect();
            match &call.problem {
                CallProblem::Drift { changes } => {
                    writeln!(f, "         call #{} ({})", call.index, args.join(", "))?;
                    for change in changes {
                        writeln!(f, "           {}", change)?;
                    }
                }
                CallProblem::Threw { error } => writeln!(
                    f,
                    "         call #{} ({}) threw: {}",
                    call.index,
                    args.join(", "),
                    error
                )?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        for function in &report.functions {
            self.write_function(f, function)?;
        }

        writeln!(f)?;
        let mut counts = vec![format!(
            "{} passed",
            report.count(|s| matches!(s, FunctionStatus::Passed))
        )];
        let tallies = [
            (report.count(|s| matches!(s, FunctionStatus::Drift)), "drifted"),
            (report.count(|s| matches!(s, FunctionStatus::NotFound)), "not found"),
            (report.count(|s| matches!(s, FunctionStatus::Skipped)), "skipped"),
            (report.count(|s| matches!(s, FunctionStatus::Failed { .. })), "failed"),
        ];
        counts.extend(
            tallies
                .iter()
                .filter(|(n, _)| *n > 0)
                .map(|(n, label)| format!("{} {}", n, label)),
        );
        writeln!(
            f,
            "{}, {}: {}",
            plural(report.functions.len(), "function"),
            plural(report.total_calls(), "call"),
            counts.join(", ")
        )?;
        if report.skipped_records > 0 {
            writeln!(f, "{} ignored", plural(report.skipped_records, "corrupt record"))?;
        }
        writeln!(f, "{}", if self.passed { "PASSED" } else { "FAILED" })
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
