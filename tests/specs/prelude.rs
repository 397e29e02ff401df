// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the binary specs.

pub use serde_json::{json, Value};
use similar_asserts::assert_eq;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

pub const BIN: &str = "stage-adapter";

/// The binary with no arguments and a quiet log filter.
pub fn cli() -> Run {
    let mut cmd = assert_cmd::Command::cargo_bin(BIN).unwrap();
    cmd.env_remove("SGE_ARCH").env("SA_LOG", "warn");
    Run { cmd }
}

/// A run directory: `metadata/`, `files/`, and the run file path.
pub struct Pipestance {
    dir: TempDir,
}

impl Pipestance {
    /// Directories created and job info seeded with the reserved fields.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("metadata")).unwrap();
        std::fs::create_dir(dir.path().join("files")).unwrap();
        let ps = Self { dir };
        ps.job_info(json!({
            "name": "SORT_READS",
            "invocation": {"call": "SORT_READS", "args": {"reads": "in.fq"}},
            "version": {"pipeline": "1.0"},
        }));
        ps
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn meta(&self) -> PathBuf {
        self.path().join("metadata")
    }

    pub fn files(&self) -> PathBuf {
        self.path().join("files")
    }

    pub fn job_info(&self, value: Value) {
        self.write_entry("jobinfo", &value);
    }

    pub fn write_entry(&self, name: &str, value: &Value) {
        std::fs::write(self.meta().join(format!("_{name}")), value.to_string()).unwrap();
    }

    pub fn entry(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.meta().join(format!("_{name}"))).ok()
    }

    pub fn json(&self, name: &str) -> Value {
        let text = self.entry(name).unwrap_or_else(|| panic!("missing entry _{name}"));
        serde_json::from_str(&text).unwrap()
    }

    pub fn has_marker(&self, key: &str) -> bool {
        self.path().join(format!("run.{key}")).exists()
    }

    /// Write an executable shell-script stage and return its path.
    pub fn stage(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// The binary invoked for `phase` of the stage at `stage`, run from `files/`.
    pub fn adapter(&self, phase: &str, stage: &Path) -> Run {
        let mut run = cli();
        run.cmd
            .current_dir(self.files())
            .arg(format!("/opt/adapters/{phase}.sh"))
            .arg(stage)
            .arg(self.meta())
            .arg(self.files())
            .arg(self.path().join("run"));
        run
    }
}

/// A pending invocation of the binary.
pub struct Run {
    cmd: assert_cmd::Command,
}

impl Run {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Outcome {
        let output = self.cmd.output().unwrap();
        assert!(
            output.status.success(),
            "expected success\n{}",
            describe(&output)
        );
        Outcome { output }
    }

    pub fn fails_with(mut self, code: i32) -> Outcome {
        let output = self.cmd.output().unwrap();
        assert_eq!(output.status.code(), Some(code), "{}", describe(&output));
        Outcome { output }
    }
}

/// A finished invocation.
pub struct Outcome {
    output: Output,
}

impl Outcome {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout);
        assert!(stdout.contains(needle), "stdout lacks {needle:?}\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr);
        assert!(stderr.contains(needle), "stderr lacks {needle:?}\n{stderr}");
        self
    }
}

fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
