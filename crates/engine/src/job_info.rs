// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filling in the job info record at start and end of a run.

use sa_core::{duration_seconds, format_timestamp, JobInfo, RuntimeInfo, Wallclock};
use sa_storage::{Entry, Journal, JournalError};
use std::path::Path;

use crate::env;
use crate::usage;

/// Add the adapter's view of the environment to `info`.
pub fn augment(info: &mut JobInfo, files_dir: &Path) {
    info.cwd = Some(files_dir.to_path_buf());
    info.host = Some(usage::hostname());
    info.pid = Some(std::process::id());
    info.runtime = Some(runtime_info());
    info.cluster_env = env::cluster_env();
}

/// The program running the stage code.
pub fn runtime_info() -> RuntimeInfo {
    let binpath = std::env::current_exe().unwrap_or_default();
    RuntimeInfo {
        binpath,
        version: format!(
            "stage-adapter {} ({})",
            env::ADAPTER_VERSION,
            env::RUSTC_VERSION
        ),
    }
}

/// Re-read job info, add wallclock and resource usage, write it back.
pub fn finalize(journal: &Journal, start_ms: u64, end_ms: u64) -> Result<JobInfo, JournalError> {
    let mut info: JobInfo = journal.read_as(Entry::JobInfo);
    info.wallclock = Some(Wallclock {
        start: format_timestamp(start_ms),
        end: format_timestamp(end_ms),
        duration_seconds: duration_seconds(start_ms, end_ms),
    });
    info.rusage = Some(usage::resource_usage());
    journal.write(Entry::JobInfo, &info)?;
    Ok(info)
}

#[cfg(test)]
#[path = "job_info_tests.rs"]
mod tests;
