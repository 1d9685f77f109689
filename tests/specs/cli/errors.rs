//! Option validation and error rendering specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    let project = Project::empty();
    project.iosnap().args(&["explode"]).fails().exit_code(2);
}

#[test]
fn port_out_of_range_is_rejected() {
    let project = Project::empty();
    project
        .iosnap()
        .args(&["status", "--port", "70000"])
        .fails()
        .stderr_has("between 1 and 65535");
}

#[test]
fn timeout_below_one_minute_is_rejected() {
    let project = Project::empty();
    project
        .iosnap()
        .args(&["record", "--timeout", "0"])
        .fails()
        .stderr_has("at least 1");
}

#[test]
fn blank_pattern_is_rejected() {
    let project = Project::empty();
    project
        .iosnap()
        .args(&["clean", ""])
        .fails()
        .stderr_has("must not be empty");
}

#[test]
fn user_errors_carry_suggestions() {
    let project = Project::empty();
    project.file("src/a.js", CART_JS);
    project
        .iosnap()
        .args(&["inject", "missing/*.js"])
        .fails()
        .exit_code(1)
        .stderr_has("error: No files matched 'missing/*.js'")
        .stderr_has("suggestions:")
        .stderr_has("  1. ");
}
