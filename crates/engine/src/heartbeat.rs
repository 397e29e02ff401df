// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic liveness signal for the orchestrator.
//!
//! The task only ever touches the `heartbeat` marker, so it never races the
//! main flow's journal writes.

use sa_storage::{Entry, Journal};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shortest period between beats. Shorter requested intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the running heartbeat task. Dropping it stops the task.
#[derive(Debug)]
pub struct Heartbeat {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Start beating on `runtime`: immediately, then every `interval`.
    pub fn spawn(runtime: &Handle, journal: Arc<Journal>, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => beat(&journal),
                }
            }
            tracing::debug!("heartbeat stopped");
        });
        tracing::debug!(interval_secs = interval.as_secs(), "heartbeat started");
        Self { cancel, task }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    /// Stop the task. A beat already being written completes; no new beat starts.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn beat(journal: &Journal) {
    if let Err(e) = journal.update_journal(Entry::Heartbeat, true) {
        tracing::warn!(error = %e, "heartbeat write failed");
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
