// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

struct Fixture {
    _project: TempDir,
    _session: TempDir,
    store: BackupStore,
}

impl Fixture {
    fn new() -> Self {
        let project = TempDir::new().unwrap();
        let session = TempDir::new().unwrap();
        let paths =
            ProjectPaths::with_session_dir(project.path(), Some(session.path().join("s"))).unwrap();
        Self {
            _project: project,
            _session: session,
            store: BackupStore::new(paths),
        }
    }

    fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.store.paths().root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn backup_writes_both_copies() {
    let fx = Fixture::new();
    let file = fx.file("src/a.ts", "export const a = 1;\n");

    let locations = fx.store.backup(&file).unwrap();

    assert_eq!(std::fs::read_to_string(&locations.primary).unwrap(), "export const a = 1;\n");
    assert_eq!(std::fs::read_to_string(&locations.fallback).unwrap(), "export const a = 1;\n");
    assert!(fx.store.has_backup(&file));
}

#[test]
fn restore_prefers_primary_and_keeps_backups() {
    let fx = Fixture::new();
    let file = fx.file("a.js", "original");
    fx.store.backup(&file).unwrap();
    std::fs::write(&file, "mutated").unwrap();

    assert_eq!(fx.store.restore(&file).unwrap(), RestoreSource::Primary);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
    assert!(fx.store.has_backup(&file));
}

#[test]
fn restore_falls_back_to_project_copy() {
    let fx = Fixture::new();
    let file = fx.file("a.js", "original");
    let locations = fx.store.backup(&file).unwrap();
    std::fs::remove_file(&locations.primary).unwrap();
    std::fs::write(&file, "mutated").unwrap();

    assert_eq!(fx.store.restore(&file).unwrap(), RestoreSource::Fallback);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
}

#[test]
fn restore_without_backup_leaves_file_alone() {
    let fx = Fixture::new();
    let file = fx.file("a.js", "current");

    let err = fx.store.restore(&file).unwrap_err();
    assert!(matches!(err, BackupError::Missing(_)));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "current");
}

#[test]
fn discard_removes_both_copies() {
    let fx = Fixture::new();
    let file = fx.file("a.js", "x");
    fx.store.backup(&file).unwrap();

    fx.store.discard(&file).unwrap();
    assert!(!fx.store.has_backup(&file));
    fx.store.discard(&file).unwrap();
}

#[test]
fn lists_backed_up_files_from_either_tree() {
    let fx = Fixture::new();
    let a = fx.file("src/a.ts", "a");
    let b = fx.file("lib/nested/b.js", "b");
    fx.store.backup(&a).unwrap();
    let b_locations = fx.store.backup(&b).unwrap();
    std::fs::remove_file(b_locations.primary).unwrap();

    let files = fx.store.backed_up_files().unwrap();
    assert_eq!(files, vec![b, a]);
}

#[test]
fn cleanup_removes_trees() {
    let fx = Fixture::new();
    let file = fx.file("a.js", "x");
    fx.store.backup(&file).unwrap();

    fx.store.cleanup().unwrap();
    assert!(!fx.store.has_backup(&file));
    assert!(!fx.store.paths().local_backup_dir.exists());
    assert!(fx.store.backed_up_files().unwrap().is_empty());
    fx.store.cleanup().unwrap();
}
