// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for stage execution and adapter setup.

use sa_core::{InvocationError, Phase};
use sa_storage::JournalError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by stage code or by the adapter while running a phase.
#[derive(Debug, Error)]
pub enum StageError {
    /// Deliberate failure with a message for the user.
    #[error("{0}")]
    Throw(String),
    /// Deliberate early termination; the run still reports success.
    #[error("{0}")]
    Exit(String),
    /// Stage code panicked.
    #[error("{0}")]
    Panic(String),
    #[error("stage does not implement the {phase} phase")]
    Unsupported { phase: Phase },
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
    #[error("invalid stage data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl StageError {
    pub fn throw(message: impl Into<String>) -> Self {
        StageError::Throw(message.into())
    }

    /// Wrap any error raised by stage code.
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StageError::Other(error.into())
    }

    /// Short label written in front of the message in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Throw(_) => "Throw",
            StageError::Exit(_) => "Exit",
            StageError::Panic(_) => "Panic",
            StageError::Unsupported { .. } => "Unsupported",
            StageError::Command { .. } => "CommandFailed",
            StageError::Json(_) => "InvalidData",
            StageError::Io(_) => "Io",
            StageError::Other(_) => "Error",
        }
    }
}

impl From<JournalError> for StageError {
    fn from(e: JournalError) -> Self {
        StageError::Other(Box::new(e))
    }
}

/// Failure to set up or finalize the adapter around a phase.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("job info is missing required field '{0}'")]
    MissingJobInfo(&'static str),
    #[error("no stage found at '{0}'")]
    StageNotFound(String),
    #[error("metadata directory {} is not usable: {source}", path.display())]
    MetadataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    /// Label used when the error is recorded in the `errors` entry.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Invocation(_) => "InvalidInvocation",
            AdapterError::Journal(_) => "Journal",
            AdapterError::MissingJobInfo(_) => "MissingJobInfo",
            AdapterError::StageNotFound(_) => "StageNotFound",
            AdapterError::MetadataDir { .. } => "MetadataDir",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
