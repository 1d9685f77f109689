//! Verification precondition specs
//!
//! Replay itself needs Node.js; these cover what is decided before it runs.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn missing_log_aborts_before_replay() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);

    project
        .iosnap()
        .args(&["test"])
        .fails()
        .exit_code(1)
        .stderr_has("No snapshots to verify")
        .stdout_lacks("PASS");
}

#[test]
fn corrupt_only_log_counts_as_empty() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);
    project.file(".snaps.jsonl", "not json\n{\"half\":\n");

    project
        .iosnap()
        .args(&["test"])
        .fails()
        .exit_code(1)
        .stderr_has("No snapshots to verify");
}

#[test]
fn test_leaves_sources_untouched() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);

    project.iosnap().args(&["test"]).fails();
    assert_eq!(project.read("src/cart.js"), CART_JS);
    assert_eq!(project.session_backups(), 0);
}
