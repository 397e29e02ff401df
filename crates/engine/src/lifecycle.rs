// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter lifecycle: set up the journal, run one phase, record the outcome.
//!
//! An [`Adapter`] exists only once initialization succeeded. `complete`,
//! `fail` and `exit` consume it, so a run is finalized exactly once.

use sa_core::{
    Clock, Invocation, JobInfo, Phase, ProfileMode, StageArgs, SystemClock, INVOCATION_FIELD,
    VERSION_FIELD,
};
use sa_storage::{Entry, Journal, JournalError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::context::StageContext;
use crate::diagnostics::{format_stackvars, format_trace};
use crate::env;
use crate::error::{AdapterError, StageError};
use crate::heartbeat::Heartbeat;
use crate::job_info;
use crate::profile::Profiler;
use crate::stage::{self, JoinInputs, PhaseInput, PhaseOutput, Stage, StageLoader};
use crate::trace::{CallSite, Tracer};
use crate::usage;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initialized,
    Running,
    Completed,
    Failed,
    Exited,
}

sa_core::simple_display! {
    LifecycleState {
        Initialized => "initialized",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Exited => "exited",
    }
}

/// How a whole invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The phase returned and its outputs were written.
    Completed,
    /// Stage code asked to stop early; its message is in `assert`.
    Exited,
    /// Diagnostics were written to `errors`.
    Failed,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed | Outcome::Exited => 0,
            Outcome::Failed => 1,
        }
    }
}

sa_core::simple_display! {
    Outcome {
        Completed => "completed",
        Exited => "exited",
        Failed => "failed",
    }
}

/// Knobs that are not part of the invocation itself.
#[derive(Clone)]
pub struct AdapterOptions {
    pub heartbeat_interval: Duration,
    pub clock: Arc<dyn Clock>,
}

impl AdapterOptions {
    pub fn from_env() -> Self {
        Self {
            heartbeat_interval: env::heartbeat_interval(),
            ..Self::default()
        }
    }
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: env::DEFAULT_HEARTBEAT_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish_non_exhaustive()
    }
}

/// One initialized adapter run.
pub struct Adapter {
    journal: Arc<Journal>,
    tracer: Tracer,
    stage: Arc<dyn Stage>,
    phase: Phase,
    profile_mode: ProfileMode,
    stackvars: bool,
    start_ms: u64,
    heartbeat: Heartbeat,
    state: LifecycleState,
}

impl Adapter {
    /// Prepare a run: journal, job info, heartbeat, file limits, stage code.
    ///
    /// Returns the adapter and the stage arguments seeded with the reserved
    /// `__invocation__` and `__version__` fields. Once the journal exists,
    /// any setup error is recorded in `errors` and the run is finalized
    /// before the error is returned.
    pub fn initialize(
        invocation: &Invocation,
        loader: &dyn StageLoader,
        runtime: &Handle,
        options: &AdapterOptions,
    ) -> Result<(Self, StageArgs), AdapterError> {
        let phase = invocation.phase()?;
        check_metadata_dir(invocation)?;

        let journal = Arc::new(
            Journal::new(
                &invocation.metadata_dir,
                &invocation.files_dir,
                &invocation.run_file,
                invocation.run_tag(),
            )
            .with_clock(Arc::clone(&options.clock)),
        );
        let start_ms = options.clock.epoch_ms();

        let prepared = Self::prepare(
            invocation,
            phase,
            loader,
            runtime,
            options,
            Arc::clone(&journal),
            start_ms,
        );
        match prepared {
            Ok(prepared) => Ok(prepared),
            Err(e) => {
                record_setup_failure(&journal, start_ms, &e);
                Err(e)
            }
        }
    }

    /// Everything after the journal exists. The heartbeat handle is dropped,
    /// and so stopped, when this returns an error.
    fn prepare(
        invocation: &Invocation,
        phase: Phase,
        loader: &dyn StageLoader,
        runtime: &Handle,
        options: &AdapterOptions,
        journal: Arc<Journal>,
        start_ms: u64,
    ) -> Result<(Self, StageArgs), AdapterError> {
        journal.log("time", "__start__")?;

        let mut info: JobInfo = journal.read_as(Entry::JobInfo);
        job_info::augment(&mut info, &invocation.files_dir);
        journal.write(Entry::JobInfo, &info)?;

        journal.update_journal(Entry::Stdout, true)?;
        journal.update_journal(Entry::Stderr, true)?;

        let args = reserved_args(&info)?;
        let heartbeat =
            Heartbeat::spawn(runtime, Arc::clone(&journal), options.heartbeat_interval);

        match usage::raise_fd_limit() {
            Ok(limit) => tracing::debug!(limit, "raised open file limit"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to raise open file limit");
                journal.log("adapter", &format!("failed to raise open file limit: {e}"))?;
            }
        }

        let stage = loader.load(&invocation.stage_code)?;

        let profile_mode = info.profile_mode();
        let stackvars = info.stackvars_enabled();
        tracing::info!(
            phase = %phase,
            tag = %journal.run_tag(),
            stage = %invocation.stage_code,
            profile = %profile_mode,
            stackvars,
            "adapter initialized"
        );

        let adapter = Self {
            journal,
            tracer: Tracer::new(),
            stage,
            phase,
            profile_mode,
            stackvars,
            start_ms,
            heartbeat,
            state: LifecycleState::Initialized,
        };
        Ok((adapter, args))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// Context handed to stage code for this run.
    pub fn context(&self) -> StageContext {
        StageContext::new(Arc::clone(&self.journal), self.tracer.clone())
    }

    /// Run one phase of the stage, through the configured profiler.
    ///
    /// The stage's result and error are returned unchanged.
    pub fn run(&mut self, input: PhaseInput) -> Result<PhaseOutput, StageError> {
        self.state = LifecycleState::Running;
        let ctx = self.context();
        let mut frame = self.tracer.enter(CallSite::new(file!(), line!(), "run"));

        let profiler = Profiler::for_mode(self.profile_mode);
        let code = self.stage.as_ref();
        let result = profiler.run(&self.tracer, &self.journal, || {
            stage::invoke(code, &ctx, input)
        });
        if result.is_err() {
            frame.fail();
        }
        result
    }

    /// Record success: timestamp `complete`, then finalize.
    pub fn complete(mut self) -> Result<(), AdapterError> {
        let marked = self.journal.write_time(Entry::Complete);
        let done = self.done(LifecycleState::Completed);
        marked?;
        done
    }

    /// Record failure diagnostics, then finalize.
    pub fn fail(mut self, error: &StageError) -> Result<(), AdapterError> {
        tracing::error!(kind = error.kind(), error = %error, "stage failed");
        let recorded = self.record_failure(error);
        let done = self.done(LifecycleState::Failed);
        recorded?;
        done
    }

    /// Stop early at the stage's request: write `assert` and skip finalization.
    pub fn exit(mut self, message: &str) -> Result<(), AdapterError> {
        tracing::info!(message, "stage requested exit");
        self.heartbeat.stop();
        self.state = LifecycleState::Exited;
        self.journal.write_raw(Entry::Assert, message)?;
        Ok(())
    }

    fn record_failure(&self, error: &StageError) -> Result<(), JournalError> {
        let frames = self.tracer.take_unwound();
        self.journal.write_raw(Entry::Errors, &format_trace(&frames, error.kind(), error))?;
        if self.stackvars {
            let report = format_stackvars(&frames, error.kind(), error);
            self.journal.write_raw(Entry::StackVars, &report)?;
        }
        Ok(())
    }

    /// Log the end time, add wallclock and rusage to job info, stop the heartbeat.
    fn done(&mut self, state: LifecycleState) -> Result<(), AdapterError> {
        self.heartbeat.stop();
        self.state = state;
        finish(&self.journal, self.start_ms)?;
        tracing::info!(state = %state, "adapter finished");
        Ok(())
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("profile_mode", &self.profile_mode)
            .field("stackvars", &self.stackvars)
            .field("journal", &self.journal)
            .finish_non_exhaustive()
    }
}

/// Drive a whole invocation: initialize, run the phase with inputs read from
/// the journal, write its outputs, and record the outcome.
pub fn run_invocation(
    invocation: &Invocation,
    loader: &dyn StageLoader,
    runtime: &Handle,
    options: &AdapterOptions,
) -> Result<Outcome, AdapterError> {
    let (mut adapter, mut args) = Adapter::initialize(invocation, loader, runtime, options)?;
    let journal = Arc::clone(adapter.journal());
    args.merge_value(journal.read(Entry::Args));

    let input = match adapter.phase() {
        Phase::Split => PhaseInput::Split { args },
        Phase::Main => PhaseInput::Main {
            args,
            outs: read_record(&journal, Entry::Outs),
        },
        Phase::Join => PhaseInput::Join {
            args,
            outs: read_record(&journal, Entry::Outs),
            chunks: JoinInputs {
                chunk_defs: journal.read_as(Entry::ChunkDefs),
                chunk_outs: journal.read_as(Entry::ChunkOuts),
            },
        },
    };

    let result = adapter.run(input).and_then(|output| {
        match &output {
            PhaseOutput::StageDefs(defs) => journal.write(Entry::StageDefs, defs)?,
            PhaseOutput::Outs(outs) => journal.write(Entry::Outs, outs)?,
        }
        Ok(())
    });

    match result {
        Ok(()) => {
            adapter.complete()?;
            Ok(Outcome::Completed)
        }
        Err(StageError::Exit(message)) => {
            adapter.exit(&message)?;
            Ok(Outcome::Exited)
        }
        Err(error) => {
            adapter.fail(&error)?;
            Ok(Outcome::Failed)
        }
    }
}

fn read_record(journal: &Journal, entry: Entry) -> StageArgs {
    StageArgs::from_value(journal.read(entry))
}

fn check_metadata_dir(invocation: &Invocation) -> Result<(), AdapterError> {
    let path = &invocation.metadata_dir;
    let fail = |source| AdapterError::MetadataDir {
        path: path.clone(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(fail)?;
    if !meta.is_dir() {
        return Err(fail(std::io::Error::other("not a directory")));
    }
    Ok(())
}

fn reserved_args(info: &JobInfo) -> Result<StageArgs, AdapterError> {
    let invocation = info.invocation.clone().ok_or(AdapterError::MissingJobInfo("invocation"))?;
    let version = info.version.clone().ok_or(AdapterError::MissingJobInfo("version"))?;
    let mut args = StageArgs::new();
    args.insert(INVOCATION_FIELD, invocation);
    args.insert(VERSION_FIELD, version);
    Ok(args)
}

/// End-of-run bookkeeping shared by every finalizing path.
fn finish(journal: &Journal, start_ms: u64) -> Result<(), JournalError> {
    journal.log("time", "__end__")?;
    let end_ms = journal.clock().epoch_ms();
    job_info::finalize(journal, start_ms, end_ms)?;
    Ok(())
}

/// Record an error raised while setting up the run. Write failures are only
/// logged so the original error reaches the caller.
fn record_setup_failure(journal: &Journal, start_ms: u64, error: &AdapterError) {
    tracing::error!(kind = error.kind(), error = %error, "adapter setup failed");
    let report = format_trace(&[], error.kind(), error);
    if let Err(e) = journal.write_raw(Entry::Errors, &report) {
        tracing::warn!(error = %e, "failed to record setup error");
    }
    if let Err(e) = finish(journal, start_ms) {
        tracing::warn!(error = %e, "failed to finalize job info");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
