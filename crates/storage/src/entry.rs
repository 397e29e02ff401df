// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Names of the files the adapter keeps under the metadata directory.

/// Prefix of every journal file name (`_jobinfo`, `_log`, ...).
pub const METADATA_PREFIX: &str = "_";

/// A journal entry. Each maps to exactly one `_<name>` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    Args,
    Outs,
    ChunkDefs,
    ChunkOuts,
    JobInfo,
    StageDefs,
    /// Append-only adapter log
    Log,
    /// Append-only stage alarms
    Alarm,
    Assert,
    Errors,
    StackVars,
    MProfile,
    Profile,
    ProfileFull,
    Complete,
    Stdout,
    Stderr,
    Heartbeat,
}

impl Entry {
    pub const ALL: [Entry; 18] = [
        Entry::Args,
        Entry::Outs,
        Entry::ChunkDefs,
        Entry::ChunkOuts,
        Entry::JobInfo,
        Entry::StageDefs,
        Entry::Log,
        Entry::Alarm,
        Entry::Assert,
        Entry::Errors,
        Entry::StackVars,
        Entry::MProfile,
        Entry::Profile,
        Entry::ProfileFull,
        Entry::Complete,
        Entry::Stdout,
        Entry::Stderr,
        Entry::Heartbeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entry::Args => "args",
            Entry::Outs => "outs",
            Entry::ChunkDefs => "chunk_defs",
            Entry::ChunkOuts => "chunk_outs",
            Entry::JobInfo => "jobinfo",
            Entry::StageDefs => "stage_defs",
            Entry::Log => "log",
            Entry::Alarm => "alarm",
            Entry::Assert => "assert",
            Entry::Errors => "errors",
            Entry::StackVars => "stackvars",
            Entry::MProfile => "mprofile",
            Entry::Profile => "profile",
            Entry::ProfileFull => "profile_full",
            Entry::Complete => "complete",
            Entry::Stdout => "stdout",
            Entry::Stderr => "stderr",
            Entry::Heartbeat => "heartbeat",
        }
    }

    /// File name under the metadata directory.
    pub fn file_name(&self) -> String {
        format!("{}{}", METADATA_PREFIX, self.as_str())
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
