// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapter.

use sa_core::ClusterEnv;
use std::path::PathBuf;
use std::time::Duration;

/// Adapter version (from Cargo.toml) plus build hash
pub const ADAPTER_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Toolchain the adapter was built with
pub const RUSTC_VERSION: &str = env!("SA_RUSTC_VERSION");

/// Default heartbeat period
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(120);

/// Heartbeat period (default 120s, configurable via `SA_HEARTBEAT_SECS`).
/// Zero or unparsable values fall back to the default.
pub fn heartbeat_interval() -> Duration {
    std::env::var("SA_HEARTBEAT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL)
}

/// Tracing filter directives: `SA_LOG`, then `RUST_LOG`.
pub fn log_filter() -> Option<String> {
    non_empty("SA_LOG").or_else(|| non_empty("RUST_LOG"))
}

/// Redirect tracing output to this file instead of stderr.
pub fn log_file() -> Option<PathBuf> {
    non_empty("SA_LOG_FILE").map(PathBuf::from)
}

/// Grid-engine job environment. Present only when `SGE_ARCH` is set.
pub fn cluster_env() -> Option<ClusterEnv> {
    std::env::var_os("SGE_ARCH")?;
    Some(ClusterEnv {
        root: var("SGE_ROOT"),
        cell: var("SGE_CELL"),
        queue: var("QUEUE"),
        jobid: var("JOB_ID"),
        jobname: var("JOB_NAME"),
        sub_host: var("SGE_O_HOST"),
        sub_user: var("SGE_O_LOGNAME"),
        exec_host: var("HOSTNAME"),
        exec_user: var("LOGNAME"),
    })
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
