// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project with its own session directory
pub struct TestProject {
    project: TempDir,
    session: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            project: TempDir::new().expect("Failed to create project directory"),
            session: TempDir::new().expect("Failed to create session directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.project.path()
    }

    pub fn session_dir(&self) -> &Path {
        self.session.path()
    }

    /// Write a file relative to the project root
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.project.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.project.path().join(rel)).expect("Failed to read file")
    }

    /// `iosnap` running inside the project with an isolated session
    pub fn iosnap(&self) -> Command {
        let mut cmd = Command::cargo_bin("iosnap").expect("iosnap binary");
        cmd.current_dir(self.project.path())
            .env("IOSNAP_SESSION_DIR", self.session.path())
            .env_remove("IOSNAP_DAEMON_PORT")
            .env_remove("IOSNAP_LOG");
        cmd
    }
}

/// A port nothing is listening on right now
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("local addr").port()
}

/// The daemon binary, when the workspace build produced one
pub fn daemon_binary() -> Option<PathBuf> {
    let path = assert_cmd::cargo::cargo_bin("iosnapd");
    path.exists().then_some(path)
}

pub const MATH_JS: &str = "export function add(a, b) {\n  return a + b;\n}\n";
