//! Shared E2E helpers for `splice` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for one-shot runs.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Variables the config loader reads; cleared so the host shell cannot leak in.
const SPLICE_VARS: &[&str] = &[
    "SPLICE_DEBUG",
    "SPLICE_HIRES",
    "SPLICE_SOURCE_NAME",
    "SPLICE_TIMEOUT_MS",
    "SPLICE_INSTRUCTION_LIMIT",
    "SPLICE_CANCEL_SUPERSEDED",
];

/// A scratch directory holding `edit.lua` and `input.txt`.
///
/// It doubles as `$HOME` and the working directory, so neither global nor
/// project config outside it is picked up.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new(script: &str, input: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp workspace");
        std::fs::write(dir.path().join("edit.lua"), script).expect("write script");
        std::fs::write(dir.path().join("input.txt"), input).expect("write input");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.join(name)).expect("read workspace file")
    }

    /// `splice edit.lua input.txt` inside the workspace.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("splice");
        cmd.timeout(TIMEOUT_BASIC);
        for var in SPLICE_VARS {
            cmd.env_remove(var);
        }
        cmd.env_remove("RUST_LOG");
        cmd.env("HOME", self.path());
        cmd.current_dir(self.path());
        cmd.args(["edit.lua", "input.txt"]);
        cmd
    }
}
