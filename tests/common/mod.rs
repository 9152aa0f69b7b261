#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Reads a file from the workspace, panicking if it is missing.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }

    pub fn exists(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    /// Binary command rooted in the workspace so no stray config file is picked up.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("csv-col-splitter").expect("binary exists");
        cmd.current_dir(self.path());
        cmd
    }
}

/// Scenario used across the suites: `info` packs `key@value` pairs.
pub const ORDERS: &str = "id;info\n1;a@x&b@y\n2;c@z&\n";
