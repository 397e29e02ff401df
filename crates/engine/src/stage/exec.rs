// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stages implemented as external programs.
//!
//! The program is run as `<program> <phase>`. It receives a JSON object with
//! `args`, `outs`, `chunk_defs` and `chunk_outs` on stdin and prints the phase
//! result as JSON on stdout: the stage defs for `split`, an object of output
//! fields for `main` and `join`.
//!
//! Requests back to the adapter go to the control file named by
//! `SA_CONTROL`, one `<verb> <message>` line each:
//!
//! ```text
//! log reading 12 files
//! warn index is stale
//! alarm coverage below 10x
//! throw bad input
//! exit nothing to align
//! ```
//!
//! `log`, `warn` and `alarm` are journaled in order. The first `throw` or
//! `exit` decides the phase result regardless of the exit status. Stderr is
//! passed through to the adapter's own, and its tail is kept in the error of
//! a program that fails without a `throw`.

use sa_core::{Phase, StageArgs};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{JoinInputs, Stage};
use crate::context::StageContext;
use crate::error::StageError;

/// Path of the control file.
pub const CONTROL_ENV: &str = "SA_CONTROL";
/// Directory holding the metadata journal.
pub const METADATA_DIR_ENV: &str = "SA_METADATA_DIR";
/// Directory for stage output files.
pub const FILES_DIR_ENV: &str = "SA_FILES_DIR";

/// Stderr lines kept in a command error.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct ExecStage {
    program: PathBuf,
}

#[derive(Serialize)]
struct Request<'a> {
    args: &'a StageArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    outs: Option<&'a StageArgs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_defs: Option<&'a [StageArgs]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_outs: Option<&'a [StageArgs]>,
}

/// One line of the control file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Log(String),
    Warn(String),
    Alarm(String),
    Throw(String),
    Exit(String),
}

impl Directive {
    /// Parse `<verb> <message>`. Blank lines and unknown verbs yield `None`.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        let (verb, message) = line.split_once(' ').unwrap_or((line, ""));
        let message = message.to_string();
        match verb {
            "log" => Some(Directive::Log(message)),
            "warn" => Some(Directive::Warn(message)),
            "alarm" => Some(Directive::Alarm(message)),
            "throw" => Some(Directive::Throw(message)),
            "exit" => Some(Directive::Exit(message)),
            _ => None,
        }
    }
}

impl ExecStage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the program inside a scope named after it.
    fn run(
        &self,
        ctx: &StageContext,
        phase: Phase,
        request: &Request<'_>,
    ) -> Result<Value, StageError> {
        let name = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string());
        let mut scope = ctx.scope(&name);
        ctx.local("program", &self.program);

        let result = self.run_program(ctx, phase, request);
        if result.is_err() {
            scope.fail();
        }
        result
    }

    fn run_program(
        &self,
        ctx: &StageContext,
        phase: Phase,
        request: &Request<'_>,
    ) -> Result<Value, StageError> {
        let input = serde_json::to_vec(request)?;
        let control = ctx.files_dir().join(format!(".stage_control_{phase}"));
        remove_control(&control)?;

        let mut command = Command::new(&self.program);
        command
            .arg(phase.as_str())
            .env(CONTROL_ENV, &control)
            .env(METADATA_DIR_ENV, ctx.journal().dir())
            .env(FILES_DIR_ENV, ctx.files_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let line = ctx.log_exec(&command);
        let failed = |reason: String| StageError::Command {
            command: line.clone(),
            reason,
        };

        let mut child = command.spawn().map_err(|e| failed(e.to_string()))?;
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || match stdin.write_all(&input) {
                // The program may exit without reading its input
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            })
        });
        let output = child.wait_with_output().map_err(|e| failed(e.to_string()))?;
        if let Err(e) = io::stderr().write_all(&output.stderr) {
            tracing::debug!(error = %e, "failed to forward stage stderr");
        }

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(failed(format!("writing input: {e}"))),
                Err(_) => return Err(failed("input writer panicked".to_string())),
            }
        }

        let directives = read_control(&control)?;
        remove_control(&control)?;
        if let Some(stop) = apply_directives(ctx, &directives) {
            return Err(stop);
        }

        if !output.status.success() {
            let mut reason = format!("exited with {}", output.status);
            let tail = stderr_tail(&output.stderr);
            if !tail.is_empty() {
                reason.push('\n');
                reason.push_str(&tail);
            }
            return Err(failed(reason));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&stdout)?)
    }
}

impl Stage for ExecStage {
    fn split(&self, ctx: &StageContext, args: &StageArgs) -> Result<Value, StageError> {
        let request = Request {
            args,
            outs: None,
            chunk_defs: None,
            chunk_outs: None,
        };
        self.run(ctx, Phase::Split, &request)
    }

    fn main(
        &self,
        ctx: &StageContext,
        args: &StageArgs,
        outs: &mut StageArgs,
    ) -> Result<(), StageError> {
        let request = Request {
            args,
            outs: Some(&*outs),
            chunk_defs: None,
            chunk_outs: None,
        };
        let result = self.run(ctx, Phase::Main, &request)?;
        merge_outs(outs, result)
    }

    fn join(
        &self,
        ctx: &StageContext,
        args: &StageArgs,
        outs: &mut StageArgs,
        chunks: &JoinInputs,
    ) -> Result<(), StageError> {
        let request = Request {
            args,
            outs: Some(&*outs),
            chunk_defs: Some(chunks.chunk_defs.as_slice()),
            chunk_outs: Some(chunks.chunk_outs.as_slice()),
        };
        let result = self.run(ctx, Phase::Join, &request)?;
        merge_outs(outs, result)
    }
}

/// Journal `log`, `warn` and `alarm` lines in order; return the first
/// `throw` or `exit`.
fn apply_directives(ctx: &StageContext, text: &str) -> Option<StageError> {
    let mut stop = None;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match Directive::parse(line) {
            Some(Directive::Log(message)) => ctx.log_info(message),
            Some(Directive::Warn(message)) => ctx.log_warn(message),
            Some(Directive::Alarm(message)) => ctx.alarm(message),
            Some(Directive::Throw(message)) => {
                stop.get_or_insert(StageError::Throw(message));
            }
            Some(Directive::Exit(message)) => {
                stop.get_or_insert(StageError::Exit(message));
            }
            None => tracing::warn!(line, "ignoring unknown stage directive"),
        }
    }
    stop
}

fn read_control(path: &Path) -> io::Result<String> {
    match std::fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        other => other,
    }
}

fn remove_control(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Last non-blank stderr lines, oldest first.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[skip..].join("\n")
}

fn merge_outs(outs: &mut StageArgs, result: Value) -> Result<(), StageError> {
    match result {
        Value::Null => Ok(()),
        Value::Object(_) => {
            outs.merge_value(result);
            Ok(())
        }
        other => Err(StageError::throw(format!("stage printed a non-object result: {other}"))),
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
