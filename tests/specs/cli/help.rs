//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let project = Project::empty();
    let run = project.iosnap().args(&["--help"]).passes();
    let run = ["inject", "record", "stop", "test", "clean", "status"]
        .iter()
        .fold(run, |run, command| run.stdout_has(command));
    run.stdout_has("--project");
}

#[test]
fn test_help_shows_filters() {
    let project = Project::empty();
    project
        .iosnap()
        .args(&["test", "--help"])
        .passes()
        .stdout_has("--only")
        .stdout_has("--format");
}

#[test]
fn record_help_shows_port_and_timeout() {
    let project = Project::empty();
    project
        .iosnap()
        .args(&["record", "--help"])
        .passes()
        .stdout_has("--port")
        .stdout_has("--timeout")
        .stdout_has("--force");
}
