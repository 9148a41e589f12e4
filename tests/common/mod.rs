//! Common test utilities for rdlc integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch a
//! database or config file outside a temporary directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A lifecycle sheet with two stages, one unknown stage and one blank row.
pub const SAMPLE_SHEET: &str = "\
RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE,DESCRIPTION (1 SENTENCE),EXAMPLES
PLAN,Data management plans,Write and maintain a DMP,\"DMPonline, DMPTool\"
PUBLISH,Repositories,Deposit data for publication,\"Zenodo, Dryad, Figshare\"
DISCOVER,Catalogues,Find existing datasets,DataCite Search
,Orphan,No stage given,Nothing
";

/// A test environment with its own working directory and database.
///
/// The `rdlc()` method returns a `Command` that runs in the temporary
/// directory with `RDLC_DB` pointing at a database inside it, and with the
/// user config directory redirected so no real config file is read.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment without a database.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and run `rdlc init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.rdlc().arg("init").assert().success();
        env
    }

    /// Create a new test environment initialized from `SAMPLE_SHEET`.
    pub fn init_with_sample() -> Self {
        let env = Self::new();
        let csv = env.write_file("sheet.csv", SAMPLE_SHEET);
        env.rdlc()
            .args(["init", "--csv"])
            .arg(&csv)
            .assert()
            .success();
        env
    }

    /// Get a Command for the rdlc binary isolated to this environment.
    pub fn rdlc(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rdlc"));
        cmd.current_dir(self.dir.path());
        cmd.env("RDLC_DB", self.db_path());
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("xdg"));
        cmd.env_remove("RDLC_CONFIG");
        cmd.env_remove("RDLC_LOG");
        cmd
    }

    /// Path of the database used by `rdlc()`.
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("lifecycle.db")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the environment and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}
