// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional profiling of the phase call.
//!
//! A profiler is a [`CallHook`] installed on the tracer for the duration of
//! the phase. Its report is written to the journal afterwards, whether the
//! phase succeeded or not.

mod cpu;
mod memory;

pub use cpu::{CpuClock, CpuProfile, CpuSnapshot, CpuStatRecord, ProcessCpuClock};
pub use memory::{FrameKey, MemoryProfile, MemorySampler, MemoryStackFrame, RusageSampler};

use parking_lot::Mutex;
use sa_core::ProfileMode;
use sa_storage::{Entry, Journal, JournalError};
use std::sync::Arc;

use crate::trace::Tracer;

/// The profiler wrapping one phase call.
pub enum Profiler {
    Disabled,
    Memory(Arc<Mutex<MemoryProfile>>),
    Cpu(Arc<Mutex<CpuProfile>>),
}

impl Profiler {
    /// Profiler for `mode` with the process's real sampler and clock.
    pub fn for_mode(mode: ProfileMode) -> Self {
        match mode {
            ProfileMode::None => Profiler::Disabled,
            ProfileMode::Memory => Self::memory(MemoryProfile::new(Box::new(RusageSampler))),
            ProfileMode::Cpu => Self::cpu(CpuProfile::new(Box::new(ProcessCpuClock))),
        }
    }

    pub fn memory(profile: MemoryProfile) -> Self {
        Profiler::Memory(Arc::new(Mutex::new(profile)))
    }

    pub fn cpu(profile: CpuProfile) -> Self {
        Profiler::Cpu(Arc::new(Mutex::new(profile)))
    }

    /// Run `f` with the profiler hooked into `tracer`, then write its report.
    ///
    /// The result of `f` is returned untouched. A report that cannot be
    /// written is logged and skipped.
    pub fn run<T>(&self, tracer: &Tracer, journal: &Journal, f: impl FnOnce() -> T) -> T {
        let result = match self {
            Profiler::Disabled => return f(),
            Profiler::Memory(profile) => {
                let _hook = tracer.install(profile.clone());
                f()
            }
            Profiler::Cpu(profile) => {
                let _hook = tracer.install(profile.clone());
                f()
            }
        };
        if let Err(e) = self.write_report(journal) {
            tracing::warn!(error = %e, "failed to write profile report");
        }
        result
    }

    fn write_report(&self, journal: &Journal) -> Result<(), JournalError> {
        match self {
            Profiler::Disabled => Ok(()),
            Profiler::Memory(profile) => {
                journal.write_raw(Entry::MProfile, &profile.lock().format_stats())
            }
            Profiler::Cpu(profile) => {
                let profile = profile.lock();
                journal.write_raw(Entry::Profile, &profile.format_stats())?;
                match profile.compressed_snapshot() {
                    Ok(bytes) => journal.write_bytes(Entry::ProfileFull, &bytes),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode profile statistics");
                        Ok(())
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profiler::Disabled => f.write_str("Profiler::Disabled"),
            Profiler::Memory(_) => f.write_str("Profiler::Memory"),
            Profiler::Cpu(_) => f.write_str("Profiler::Cpu"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
