// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CPU time per call site.

use indexmap::IndexMap;
use nix::time::{clock_gettime, ClockId};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::trace::{CallHook, CallSite};

/// Source of process CPU time.
pub trait CpuClock: Send {
    fn cpu_time(&self) -> Duration;
}

/// `CLOCK_PROCESS_CPUTIME_ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCpuClock;

impl CpuClock for ProcessCpuClock {
    fn cpu_time(&self) -> Duration {
        match clock_gettime(ClockId::CLOCK_PROCESS_CPUTIME_ID) {
            Ok(ts) => Duration::new(
                u64::try_from(ts.tv_sec()).unwrap_or(0),
                u32::try_from(ts.tv_nsec()).unwrap_or(0),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "process cpu clock unavailable");
                Duration::ZERO
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SiteStats {
    ncalls: u64,
    /// Time in the site itself, excluding nested scopes.
    tottime: Duration,
    /// Time including nested scopes, outermost active call only.
    cumtime: Duration,
    active: usize,
}

struct ActiveCall {
    site: CallSite,
    start: Duration,
    nested: Duration,
}

/// CPU profiler hook.
pub struct CpuProfile {
    clock: Box<dyn CpuClock>,
    stats: IndexMap<CallSite, SiteStats>,
    stack: Vec<ActiveCall>,
}

/// Serialized statistics, written compressed to `profile_full`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub total_calls: u64,
    pub total_seconds: f64,
    pub stats: Vec<CpuStatRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStatRecord {
    pub file: String,
    pub line: u32,
    pub function: String,
    pub ncalls: u64,
    pub tottime_ns: u64,
    pub cumtime_ns: u64,
}

impl CpuProfile {
    pub fn new(clock: Box<dyn CpuClock>) -> Self {
        Self {
            clock,
            stats: IndexMap::new(),
            stack: Vec::new(),
        }
    }

    /// Statistics ordered by cumulative time, largest first.
    pub fn snapshot(&self) -> CpuSnapshot {
        let mut stats: Vec<CpuStatRecord> = self
            .stats
            .iter()
            .map(|(site, s)| CpuStatRecord {
                file: site.file.to_string(),
                line: site.line,
                function: site.name.clone(),
                ncalls: s.ncalls,
                tottime_ns: nanos(s.tottime),
                cumtime_ns: nanos(s.cumtime),
            })
            .collect();
        stats.sort_by(|a, b| b.cumtime_ns.cmp(&a.cumtime_ns));
        CpuSnapshot {
            total_calls: stats.iter().map(|s| s.ncalls).sum(),
            total_seconds: self.stats.values().map(|s| s.tottime).sum::<Duration>().as_secs_f64(),
            stats,
        }
    }

    /// Text report in the familiar profiler layout, sorted by cumulative time.
    pub fn format_stats(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "         {} function calls in {:.3} seconds",
            snapshot.total_calls, snapshot.total_seconds
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "   Ordered by: cumulative time");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "   ncalls  tottime  percall  cumtime  percall filename:lineno(function)"
        );
        for s in &snapshot.stats {
            let tottime = secs(s.tottime_ns);
            let cumtime = secs(s.cumtime_ns);
            let calls = s.ncalls.max(1) as f64;
            let _ = writeln!(
                out,
                "{:>9} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {}:{}({})",
                s.ncalls,
                tottime,
                tottime / calls,
                cumtime,
                cumtime / calls,
                s.file,
                s.line,
                s.function
            );
        }
        out
    }

    /// Snapshot as zstd-compressed JSON.
    pub fn compressed_snapshot(&self) -> std::io::Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.snapshot()).map_err(std::io::Error::other)?;
        zstd::encode_all(json.as_slice(), 3)
    }
}

impl CallHook for CpuProfile {
    fn on_call(&mut self, site: &CallSite, _caller: Option<&CallSite>) {
        self.stats.entry(site.clone()).or_default().active += 1;
        let start = self.clock.cpu_time();
        self.stack.push(ActiveCall {
            site: site.clone(),
            start,
            nested: Duration::ZERO,
        });
    }

    fn on_return(&mut self, site: &CallSite, _caller: Option<&CallSite>) {
        if self.stack.last().map(|call| &call.site) != Some(site) {
            return;
        }
        let now = self.clock.cpu_time();
        let Some(call) = self.stack.pop() else {
            return;
        };
        let elapsed = now.saturating_sub(call.start);
        if let Some(stats) = self.stats.get_mut(site) {
            stats.ncalls += 1;
            stats.tottime += elapsed.saturating_sub(call.nested);
            stats.active = stats.active.saturating_sub(1);
            if stats.active == 0 {
                stats.cumtime += elapsed;
            }
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.nested += elapsed;
        }
    }
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn secs(ns: u64) -> f64 {
    Duration::from_nanos(ns).as_secs_f64()
}

#[cfg(test)]
#[path = "cpu_tests.rs"]
mod tests;
