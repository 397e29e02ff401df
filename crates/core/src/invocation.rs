// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Positional invocation contract between the orchestrator and the adapter.

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

use crate::phase::{Phase, RunTag};

/// Errors from interpreting the process arguments.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("expected {expected} positional arguments, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("unknown phase '{0}' (expected split, main or join)")]
    UnknownPhase(String),
}

/// The five positional parameters the orchestrator passes to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Runner identifier; its file name selects the run tag.
    pub runner: PathBuf,
    /// Where the stage code lives (registered name or executable path).
    pub stage_code: String,
    /// Directory holding the `_<entry>` journal files.
    pub metadata_dir: PathBuf,
    /// Directory where stage code writes its output files.
    pub files_dir: PathBuf,
    /// Base path for freshness markers.
    pub run_file: PathBuf,
}

impl Invocation {
    pub const ARITY: usize = 5;

    /// Build from positional arguments, excluding the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self, InvocationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let [runner, stage_code, metadata_dir, files_dir, run_file]: [OsString; Self::ARITY] =
            args.try_into().map_err(|v: Vec<OsString>| InvocationError::WrongArity {
                expected: Self::ARITY,
                got: v.len(),
            })?;
        Ok(Self {
            runner: runner.into(),
            stage_code: stage_code.to_string_lossy().into_owned(),
            metadata_dir: metadata_dir.into(),
            files_dir: files_dir.into(),
            run_file: run_file.into(),
        })
    }

    pub fn run_tag(&self) -> RunTag {
        RunTag::from_runner(&self.runner)
    }

    /// The phase selected by the runner identifier.
    pub fn phase(&self) -> Result<Phase, InvocationError> {
        self.run_tag().phase()
    }
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
