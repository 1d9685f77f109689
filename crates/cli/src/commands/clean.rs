// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iosnap clean`: restore sources and delete the snapshot log

use super::stop::print_restore;
use super::Project;
use anyhow::Result;
use iosnap_core::config::validate_pattern;
use iosnap_engine::Restorer;
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct CleanArgs {
    /// Restore only backed-up files matching this glob
    #[arg(value_parser = validate_pattern)]
    pub target: Option<String>,
}

pub fn handle(project: &Project, args: CleanArgs) -> Result<ExitCode> {
    let report = Restorer::new(project.store()).clean(args.target.as_deref())?;
    print_restore(project, &report.restore);

    if report.log_removed {
        println!("Deleted {}", project.display(&project.paths.snapshot_log));
    }
    if report.restore.backups_removed {
        println!("Removed backups.");
    }

    Ok(if report.restore.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
