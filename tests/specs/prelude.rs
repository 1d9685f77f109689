//! Shared fixtures for black-box specs

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub use similar_asserts::assert_eq;

/// A file that exports two functions
pub const CART_JS: &str = "\
// cart helpers
export function add(a, b) {
  return a + b;
}

export const total = (items) => items.reduce((sum, item) => sum + item.price, 0);
";

/// A TypeScript module with overloads and an async arrow
pub const PARSE_TS: &str = "\
export function parse(x: string): number;
export function parse(x: number): number;
export function parse(x: any): number {
  return Number(x);
}

export const load = async (id: string): Promise<string> => id;
";

/// Temporary project plus an isolated session directory
pub struct Project {
    dir: TempDir,
    session: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            session: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    /// Files under the session's backup tree
    pub fn session_backups(&self) -> usize {
        fn walk(dir: &Path) -> usize {
            let Ok(entries) = fs::read_dir(dir) else {
                return 0;
            };
            entries
                .flatten()
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() {
                        walk(&path)
                    } else {
                        1
                    }
                })
                .sum()
        }
        walk(&self.session.path().join("backup"))
    }

    /// Simulate the temp directory being wiped between sessions
    pub fn drop_session_dir(&self) {
        fs::remove_dir_all(self.session.path()).unwrap();
    }

    pub fn iosnap(&self) -> CliBuilder {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("iosnap").unwrap();
        cmd.current_dir(self.dir.path())
            .env("IOSNAP_SESSION_DIR", self.session.path())
            .env_remove("IOSNAP_DAEMON_PORT")
            .env_remove("IOSNAP_LOG");
        CliBuilder { cmd }
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and require exit status 0
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(run.code == Some(0), "expected success\n{}", run.describe());
        run
    }

    /// Run and require a nonzero exit status
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(run.code != Some(0), "expected failure\n{}", run.describe());
        run
    }
}

pub struct RunAssert {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    fn describe(&self) -> String {
        format!(
            "exit: {:?}\n--- stdout ---\n{}\n--- stderr ---\n{}",
            self.code, self.stdout, self.stderr
        )
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}\n{}",
            self.describe()
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout has {needle:?}\n{}",
            self.describe()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}\n{}",
            self.describe()
        );
        self
    }

    pub fn exit_code(self, code: i32) -> Self {
        assert!(self.code == Some(code), "expected exit {code}\n{}", self.describe());
        self
    }
}
