// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job info record: invocation, environment, timing and resource usage of one run.
//!
//! The orchestrator seeds this record before launching the adapter. The adapter
//! merges its own fields at initialization and adds `wallclock`/`rusage` once at
//! finalization. Fields it does not know about are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Consolidated record stored in the `jobinfo` journal entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackvars_flag: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_env: Option<ClusterEnv>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallclock: Option<Wallclock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rusage: Option<ResourceUsage>,
    /// Orchestrator-owned fields (`name`, `type`, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobInfo {
    /// Profiling mode requested by the orchestrator.
    pub fn profile_mode(&self) -> ProfileMode {
        self.profile_mode.as_deref().map(ProfileMode::parse).unwrap_or_default()
    }

    /// Whether local variables should be captured on failure.
    ///
    /// Accepts the string flags `"stackvars"`/`"localvars"` and a JSON `true`.
    pub fn stackvars_enabled(&self) -> bool {
        match &self.stackvars_flag {
            Some(Value::String(s)) => s == "stackvars" || s == "localvars",
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }
}

/// Descriptor of the program running the stage code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub binpath: PathBuf,
    pub version: String,
}

/// Grid-engine environment captured when running under a cluster scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEnv {
    pub root: Option<String>,
    pub cell: Option<String>,
    pub queue: Option<String>,
    pub jobid: Option<String>,
    pub jobname: Option<String>,
    pub sub_host: Option<String>,
    pub sub_user: Option<String>,
    pub exec_host: Option<String>,
    pub exec_user: Option<String>,
}

/// Start/end of the run and its duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallclock {
    pub start: String,
    pub end: String,
    pub duration_seconds: f64,
}

/// Flat `ru_*` field → integer maps for this process and its reaped children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    #[serde(rename = "self")]
    pub own: BTreeMap<String, i64>,
    pub children: BTreeMap<String, i64>,
}

/// Which profiler wraps the phase call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    #[default]
    None,
    Cpu,
    Memory,
}

impl ProfileMode {
    /// Lenient parse of the job info value. Unknown values disable profiling.
    pub fn parse(value: &str) -> Self {
        match value {
            "cpu" | "profile" => ProfileMode::Cpu,
            "mem" | "memory" => ProfileMode::Memory,
            _ => ProfileMode::None,
        }
    }
}

crate::simple_display! {
    ProfileMode {
        None => "none",
        Cpu => "cpu",
        Memory => "memory",
    }
}

#[cfg(test)]
#[path = "job_info_tests.rs"]
mod tests;
