//! Re-injection specs

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn second_inject_changes_nothing() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);

    project.iosnap().args(&["inject"]).passes();
    let first = project.read("src/cart.js");

    project
        .iosnap()
        .args(&["inject"])
        .passes()
        .stdout_has("1 already instrumented");
    assert_eq!(project.read("src/cart.js"), first);
}

#[test]
fn force_reinjects_from_pristine_copy() {
    let project = Project::empty();
    project.file("src/cart.js", CART_JS);

    project.iosnap().args(&["inject"]).passes();
    let first = project.read("src/cart.js");

    project
        .iosnap()
        .args(&["inject", "--force"])
        .passes()
        .stdout_has("injected  src/cart.js (add, total)");

    let forced = project.read("src/cart.js");
    assert_eq!(forced, first);
    assert_eq!(forced.matches("function __snap_record").count(), 1);

    project.iosnap().args(&["clean"]).passes();
    assert_eq!(project.read("src/cart.js"), CART_JS);
}

#[test]
fn bootstrap_lands_after_directives() {
    let project = Project::empty();
    let source = "#!/usr/bin/env node\n'use strict';\nexport function main() {}\n";
    project.file("bin.js", source);

    project.iosnap().args(&["inject"]).passes();
    let text = project.read("bin.js");
    assert!(text.starts_with("#!/usr/bin/env node\n'use strict';\n"));
    assert!(text.contains("export const main = __snap_record(_snap_main, 'main');"));

    project.iosnap().args(&["clean"]).passes();
    assert_eq!(project.read("bin.js"), source);
}
