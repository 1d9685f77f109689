// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::instrument::Instrumenter;
use iosnap_core::ProjectPaths;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    _session: TempDir,
    store: BackupStore,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let session = TempDir::new().unwrap();
        let paths =
            ProjectPaths::with_session_dir(root.path(), Some(session.path().join("s"))).unwrap();
        Self {
            _root: root,
            _session: session,
            store: BackupStore::new(paths),
        }
    }

    fn root(&self) -> &Path {
        &self.store.paths().root
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn inject(&self) {
        Instrumenter::new(self.store.clone(), 9444)
            .inject("**/*.js", false)
            .unwrap();
    }

    fn restorer(&self) -> Restorer {
        Restorer::new(self.store.clone())
    }
}

const A: &str = "export function a() { return 1; }\n";
const B: &str = "export const b = () => 2;\n";

#[test]
fn restores_everything_and_removes_backups() {
    let fx = Fixture::new();
    let a = fx.write("src/a.js", A);
    let b = fx.write("src/b.js", B);
    fx.inject();

    let report = fx.restorer().restore(None).unwrap();

    assert_eq!(report.restored, vec![a.clone(), b.clone()]);
    assert!(report.backups_removed);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), A);
    assert_eq!(std::fs::read_to_string(&b).unwrap(), B);
    assert!(!fx.store.paths().local_backup_dir.exists());
    assert!(!fx.store.paths().backup_dir.exists());
}

#[test]
fn pattern_limits_restore_and_keeps_other_backups() {
    let fx = Fixture::new();
    let a = fx.write("src/a.js", A);
    let b = fx.write("lib/b.js", B);
    fx.inject();

    let report = fx.restorer().restore(Some("src/*.js")).unwrap();

    assert_eq!(report.restored, vec![a.clone()]);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), A);
    assert!(!fx.store.has_backup(&a));
    assert!(fx.store.has_backup(&b));
    assert_ne!(std::fs::read_to_string(&b).unwrap(), B);
}

#[test]
fn fallback_copy_is_used_when_session_dir_is_gone() {
    let fx = Fixture::new();
    let a = fx.write("a.js", A);
    fx.inject();
    std::fs::remove_dir_all(&fx.store.paths().backup_dir).unwrap();

    let report = fx.restorer().restore(None).unwrap();

    assert_eq!(report.restored, vec![a.clone()]);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), A);
}

#[test]
fn nothing_to_restore_is_fine() {
    let fx = Fixture::new();
    fx.write("a.js", A);

    let report = fx.restorer().restore(None).unwrap();
    assert!(report.restored.is_empty());
    assert!(report.is_clean());

    let report = fx.restorer().restore(Some("nothing/*.js")).unwrap();
    assert!(report.restored.is_empty());
}

#[test]
fn clean_removes_log_and_restores() {
    let fx = Fixture::new();
    let a = fx.write("a.js", A);
    fx.inject();
    std::fs::write(&fx.store.paths().snapshot_log, "{}\n").unwrap();

    let report = fx.restorer().clean(None).unwrap();

    assert!(report.log_removed);
    assert_eq!(report.restore.restored, vec![a.clone()]);
    assert!(!fx.store.paths().snapshot_log.exists());
    assert_eq!(std::fs::read_to_string(&a).unwrap(), A);
}

#[test]
fn clean_without_log_reports_nothing_removed() {
    let fx = Fixture::new();
    let report = fx.restorer().clean(None).unwrap();
    assert!(!report.log_removed);
}
