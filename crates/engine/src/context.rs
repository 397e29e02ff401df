// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handle stage code receives for logging, paths, subprocesses and
//! instrumentation.

use sa_core::RunTag;
use sa_storage::{Entry, Journal, JournalError};
use serde::Serialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;

use crate::error::StageError;
use crate::trace::{CallSite, FrameGuard, Tracer};

/// Per-run services for stage code.
///
/// Logging helpers never fail: a journal write error is reported through
/// tracing and otherwise ignored.
#[derive(Debug, Clone)]
pub struct StageContext {
    journal: Arc<Journal>,
    tracer: Tracer,
}

impl StageContext {
    pub fn new(journal: Arc<Journal>, tracer: Tracer) -> Self {
        Self { journal, tracer }
    }

    /// Context over a scratch directory, for exercising stage code in tests.
    ///
    /// Creates `<dir>/metadata` and `<dir>/files`; markers go to `<dir>/run.*`.
    pub fn standalone(dir: &Path) -> std::io::Result<Self> {
        let metadata = dir.join("metadata");
        let files = dir.join("files");
        std::fs::create_dir_all(&metadata)?;
        std::fs::create_dir_all(&files)?;
        let journal = Journal::new(metadata, files, dir.join("run"), RunTag::main());
        Ok(Self::new(Arc::new(journal), Tracer::new()))
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn files_dir(&self) -> &Path {
        self.journal.files_dir()
    }

    /// Path for a stage output file inside the files directory.
    pub fn make_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.journal.files_dir().join(name)
    }

    pub fn log_info(&self, message: impl AsRef<str>) {
        self.log("info", message.as_ref());
    }

    pub fn log_warn(&self, message: impl AsRef<str>) {
        self.log("warn", message.as_ref());
    }

    pub fn log_time(&self, message: impl AsRef<str>) {
        self.log("time", message.as_ref());
    }

    /// Log `label` followed by `value` rendered as JSON.
    pub fn log_json<T: Serialize + ?Sized>(&self, label: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.log("json", &format!("{label}: {json}")),
            Err(e) => tracing::warn!(label, error = %e, "failed to render value for log"),
        }
    }

    /// Raise a non-fatal alarm for the user.
    pub fn alarm(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if let Err(e) = self.journal.alarm(message) {
            report(Entry::Alarm, &e);
        }
        self.log("alarm", message);
    }

    /// Error that ends the run successfully with `message` as an assertion.
    pub fn exit(&self, message: impl Into<String>) -> StageError {
        StageError::Exit(message.into())
    }

    /// Error that fails the run with `message`.
    pub fn throw(&self, message: impl Into<String>) -> StageError {
        StageError::Throw(message.into())
    }

    /// Run `command` to completion, failing on a nonzero exit status.
    pub fn check_call(&self, command: &mut Command) -> Result<(), StageError> {
        let line = self.log_exec(command);
        let status = command.status().map_err(|e| StageError::Command {
            command: line.clone(),
            reason: e.to_string(),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(StageError::Command {
                command: line,
                reason: format!("exited with {status}"),
            })
        }
    }

    /// Start `command` and hand back the child.
    pub fn spawn(&self, command: &mut Command) -> Result<Child, StageError> {
        let line = self.log_exec(command);
        command.spawn().map_err(|e| StageError::Command {
            command: line,
            reason: e.to_string(),
        })
    }

    /// Run `f` inside an instrumentation scope named `name`.
    ///
    /// The scope is attributed to the caller's source location. An `Err`
    /// result marks the scope as part of the failure chain.
    #[track_caller]
    pub fn call<T, E>(&self, name: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut frame = self.tracer.enter(CallSite::here(name));
        let result = f();
        if result.is_err() {
            frame.fail();
        }
        result
    }

    /// Open a scope by hand. Call [`FrameGuard::fail`] before dropping it on error.
    #[track_caller]
    pub fn scope(&self, name: &str) -> FrameGuard {
        self.tracer.enter(CallSite::here(name))
    }

    /// Record a local variable in the current scope, rendered as JSON.
    pub fn local<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        self.tracer.record_local(name, serde_json::to_string(value).ok());
    }

    /// Record a local variable in the current scope, rendered with `Debug`.
    pub fn local_debug<T: Debug + ?Sized>(&self, name: &str, value: &T) {
        self.tracer.record_local(name, Some(format!("{value:?}")));
    }

    /// Log a command line about to run and return it.
    pub(crate) fn log_exec(&self, command: &Command) -> String {
        let line = command_line(command);
        self.log("exec", &line);
        line
    }

    fn log(&self, level: &str, message: &str) {
        if let Err(e) = self.journal.log(level, message) {
            report(Entry::Log, &e);
        }
    }
}

fn report(entry: Entry, error: &JournalError) {
    tracing::warn!(entry = %entry, error = %error, "journal write failed");
}

/// Program and arguments joined by spaces.
pub(crate) fn command_line(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
