// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage phases and the run tag that namespaces freshness markers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::invocation::InvocationError;

/// One operation a stage exposes. Exactly one phase runs per adapter process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fan out: decide how to chunk the work.
    Split,
    /// Process a single chunk.
    Main,
    /// Fan in: combine chunk outputs.
    Join,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Split, Phase::Main, Phase::Join];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Split => "split",
            Phase::Main => "main",
            Phase::Join => "join",
        }
    }

    /// Whether `name` is one of the recognized phase names.
    pub fn is_phase_name(name: &str) -> bool {
        Self::ALL.iter().any(|p| p.as_str() == name)
    }
}

crate::simple_display! {
    Phase {
        Split => "split",
        Main => "main",
        Join => "join",
    }
}

impl FromStr for Phase {
    type Err = InvocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InvocationError::UnknownPhase(s.to_string()))
    }
}

/// Namespace distinguishing concurrent adapter invocations that share a run
/// directory. Markers for the `main` tag are unprefixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunTag(String);

impl RunTag {
    pub const MAIN: &'static str = "main";

    /// Length of the runner file extension stripped to obtain the tag.
    const RUNNER_SUFFIX_LEN: usize = 3;

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn main() -> Self {
        Self::new(Self::MAIN)
    }

    /// Derive the tag from the runner identifier: its file name without the
    /// trailing three characters (`/adapters/split.sh` → `split`).
    pub fn from_runner(runner: &Path) -> Self {
        let name = runner
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let cut = name
            .char_indices()
            .rev()
            .nth(Self::RUNNER_SUFFIX_LEN - 1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        Self(name[..cut].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0 == Self::MAIN
    }

    /// The phase this tag selects, if it names one.
    pub fn phase(&self) -> Result<Phase, InvocationError> {
        self.0.parse()
    }

    /// Marker key for a journal entry: `<entry>` for `main`, `<tag>_<entry>` otherwise.
    pub fn marker_key(&self, entry: &str) -> String {
        if self.is_main() {
            entry.to_string()
        } else {
            format!("{}_{}", self.0, entry)
        }
    }
}

impl std::fmt::Display for RunTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
