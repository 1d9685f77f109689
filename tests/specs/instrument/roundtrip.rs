//! Inject/restore round-trip specs

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn clean_restores_byte_identical_sources() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);
    project.file("src/parse.ts", PARSE_TS);

    project
        .iosnap()
        .args(&["inject"])
        .passes()
        .stdout_has("injected  src/cart.js (add, total)")
        .stdout_has("injected  src/parse.ts (parse, load)")
        .stdout_has("Instrumented 4 functions in 2 files");

    assert!(project.read("src/cart.js").contains("__snap_record"));
    assert!(project.read("src/parse.ts").contains("__snap_record"));

    project.iosnap().args(&["clean"]).passes().stdout_has("Restored 2 files");

    assert_eq!(project.read("src/cart.js"), CART_JS);
    assert_eq!(project.read("src/parse.ts"), PARSE_TS);
    assert_eq!(project.session_backups(), 0);
}

#[test]
fn file_without_exported_functions_is_left_alone() {
    let project = Project::empty();
    let source = "export const LIMIT = 10;\nexport { LIMIT as MAX };\n";
    project.file("consts.js", source);

    project
        .iosnap()
        .args(&["inject"])
        .passes()
        .stdout_lacks("injected")
        .stdout_has("Instrumented 0 functions in 0 files");

    assert_eq!(project.read("consts.js"), source);
    assert_eq!(project.session_backups(), 0);
    assert!(!project.exists(".io-snapshot-backups"));
}

#[test]
fn backups_survive_loss_of_session_directory() {
    let project = Project::empty();
    project.file("lib.js", CART_JS);

    project.iosnap().args(&["inject"]).passes();
    assert!(project.exists(".io-snapshot-backups/lib.js.snap.bak"));

    project.drop_session_dir();
    project.iosnap().args(&["clean"]).passes();
    assert_eq!(project.read("lib.js"), CART_JS);
    assert!(!project.exists(".io-snapshot-backups"));
}

#[test]
fn clean_removes_snapshot_log() {
    let project = Project::empty();
    project.file("lib.js", CART_JS);
    project.file(".snaps.jsonl", "{\"fnName\":\"add\"}\n");

    project.iosnap().args(&["inject"]).passes();
    project
        .iosnap()
        .args(&["clean"])
        .passes()
        .stdout_has("Deleted .snaps.jsonl");

    assert!(!project.exists(".snaps.jsonl"));
    assert_eq!(project.read("lib.js"), CART_JS);
}
