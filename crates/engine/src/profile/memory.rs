// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resident-memory attribution per (call site, caller) pair.

use indexmap::IndexMap;

use crate::trace::{CallHook, CallSite};
use crate::usage;

/// Source of resident-memory readings in kilobytes.
pub trait MemorySampler: Send {
    fn resident_kb(&self) -> i64;
}

/// Peak RSS of this process plus its reaped children, from `getrusage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RusageSampler;

impl MemorySampler for RusageSampler {
    fn resident_kb(&self) -> i64 {
        usage::peak_rss_kb()
    }
}

/// Attribution key: where the scope was opened and who opened it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub site: CallSite,
    pub caller: Option<CallSite>,
}

/// Counters for one [`FrameKey`].
///
/// Readings taken at entry are kept on a stack so a recursive call's return
/// is measured against its own entry reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStackFrame {
    active_calls: Vec<i64>,
    pub n_calls: u64,
    pub max_rss_kb: i64,
    pub total_mem_kb: i64,
}

impl MemoryStackFrame {
    pub fn call_func(&mut self, resident_kb: i64) {
        self.active_calls.push(resident_kb);
    }

    /// Close the most recent open call. A return with no open call is ignored.
    pub fn return_func(&mut self, resident_kb: i64) {
        let Some(start) = self.active_calls.pop() else {
            return;
        };
        let used = resident_kb - start;
        self.n_calls += 1;
        self.max_rss_kb = self.max_rss_kb.max(used);
        self.total_mem_kb += used;
    }

    /// Open calls still waiting for their return.
    pub fn pending(&self) -> usize {
        self.active_calls.len()
    }

    pub fn per_call_kb(&self) -> i64 {
        match i64::try_from(self.n_calls) {
            Ok(n) if n > 0 => self.total_mem_kb / n,
            _ => 0,
        }
    }
}

/// Memory profiler hook.
pub struct MemoryProfile {
    sampler: Box<dyn MemorySampler>,
    frames: IndexMap<FrameKey, MemoryStackFrame>,
}

const HEADERS: [&str; 5] = [
    "ncalls",
    "maxrss(kb)",
    "totalmem(kb)",
    "percall(kb)",
    "filename:lineno(function) <--- caller_filename:lineno(caller_function)",
];

const COLUMN_GAP: &str = "    ";

impl MemoryProfile {
    pub fn new(sampler: Box<dyn MemorySampler>) -> Self {
        Self {
            sampler,
            frames: IndexMap::new(),
        }
    }

    pub fn frame(&self, key: &FrameKey) -> Option<&MemoryStackFrame> {
        self.frames.get(key)
    }

    /// Frames sorted by peak delta, largest first. Ties keep first-seen order.
    pub fn sorted_frames(&self) -> Vec<(&FrameKey, &MemoryStackFrame)> {
        let mut frames: Vec<_> = self.frames.iter().collect();
        frames.sort_by(|a, b| b.1.max_rss_kb.cmp(&a.1.max_rss_kb));
        frames
    }

    /// Fixed-width report, one row per frame, each value right-aligned under
    /// its header.
    pub fn format_stats(&self) -> String {
        let mut out = HEADERS.join(COLUMN_GAP);
        out.push('\n');
        for (key, frame) in self.sorted_frames() {
            let caller = match &key.caller {
                Some(c) => c.to_string(),
                None => "~:0(<root>)".to_string(),
            };
            let cells = [
                frame.n_calls.to_string(),
                frame.max_rss_kb.to_string(),
                frame.total_mem_kb.to_string(),
                frame.per_call_kb().to_string(),
                format!("{} <--- {}", key.site, caller),
            ];
            let row: Vec<String> = cells
                .iter()
                .zip(HEADERS)
                .map(|(cell, header)| format!("{cell:>width$}", width = header.len()))
                .collect();
            out.push_str(&row.join(COLUMN_GAP));
            out.push('\n');
        }
        out
    }

    fn key(site: &CallSite, caller: Option<&CallSite>) -> FrameKey {
        FrameKey {
            site: site.clone(),
            caller: caller.cloned(),
        }
    }
}

impl CallHook for MemoryProfile {
    fn on_call(&mut self, site: &CallSite, caller: Option<&CallSite>) {
        let reading = self.sampler.resident_kb();
        self.frames.entry(Self::key(site, caller)).or_default().call_func(reading);
    }

    fn on_return(&mut self, site: &CallSite, caller: Option<&CallSite>) {
        let key = Self::key(site, caller);
        if let Some(frame) = self.frames.get_mut(&key) {
            let reading = self.sampler.resident_kb();
            frame.return_func(reading);
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
