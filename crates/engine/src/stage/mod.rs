// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage contract and the phase bootstrap that invokes it.

mod exec;
mod registry;

pub use exec::ExecStage;
pub use registry::{StageLoader, StageRegistry};

use sa_core::{Phase, StageArgs};
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::context::StageContext;
use crate::error::StageError;
use crate::trace::{CallSite, TraceFrame};

/// Source file of the phase bootstrap scope. Diagnostics treat a frame from
/// this file named after a phase as the start of stage code.
pub(crate) const BOOTSTRAP_FILE: &str = file!();

/// User stage code.
///
/// A stage implements the phases it supports; the others report
/// [`StageError::Unsupported`].
pub trait Stage: Send + Sync {
    /// Decide how to chunk the work. The returned value becomes `stage_defs`.
    fn split(&self, ctx: &StageContext, args: &StageArgs) -> Result<Value, StageError> {
        let _ = (ctx, args);
        Err(StageError::Unsupported {
            phase: Phase::Split,
        })
    }

    /// Process one chunk, filling `outs`.
    fn main(
        &self,
        ctx: &StageContext,
        args: &StageArgs,
        outs: &mut StageArgs,
    ) -> Result<(), StageError> {
        let _ = (ctx, args, outs);
        Err(StageError::Unsupported { phase: Phase::Main })
    }

    /// Combine chunk results into `outs`.
    fn join(
        &self,
        ctx: &StageContext,
        args: &StageArgs,
        outs: &mut StageArgs,
        chunks: &JoinInputs,
    ) -> Result<(), StageError> {
        let _ = (ctx, args, outs, chunks);
        Err(StageError::Unsupported { phase: Phase::Join })
    }
}

/// Per-chunk definitions and outputs handed to `join`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinInputs {
    pub chunk_defs: Vec<StageArgs>,
    pub chunk_outs: Vec<StageArgs>,
}

/// Inputs of one phase call.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseInput {
    Split { args: StageArgs },
    Main { args: StageArgs, outs: StageArgs },
    Join {
        args: StageArgs,
        outs: StageArgs,
        chunks: JoinInputs,
    },
}

impl PhaseInput {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseInput::Split { .. } => Phase::Split,
            PhaseInput::Main { .. } => Phase::Main,
            PhaseInput::Join { .. } => Phase::Join,
        }
    }

    pub fn args(&self) -> &StageArgs {
        match self {
            PhaseInput::Split { args }
            | PhaseInput::Main { args, .. }
            | PhaseInput::Join { args, .. } => args,
        }
    }
}

/// Result of one phase call.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutput {
    /// Value returned by `split`.
    StageDefs(Value),
    /// Record filled by `main` or `join`.
    Outs(StageArgs),
}

/// Whether `frame` is the bootstrap scope of a phase.
pub(crate) fn is_bootstrap(frame: &TraceFrame) -> bool {
    frame.site.file == BOOTSTRAP_FILE && Phase::is_phase_name(&frame.site.name)
}

/// Run one phase of `stage` inside the bootstrap scope.
///
/// A panic in stage code becomes [`StageError::Panic`]; every other result is
/// returned unchanged.
pub(crate) fn invoke(
    stage: &dyn Stage,
    ctx: &StageContext,
    input: PhaseInput,
) -> Result<PhaseOutput, StageError> {
    let phase = input.phase();
    let mut frame = ctx.tracer().enter(CallSite::new(BOOTSTRAP_FILE, line!(), phase.as_str()));
    ctx.local("args", input.args());
    if let PhaseInput::Main { outs, .. } | PhaseInput::Join { outs, .. } = &input {
        ctx.local("outs", outs);
    }

    let result = catch_unwind(AssertUnwindSafe(|| dispatch(stage, ctx, input)))
        .unwrap_or_else(|payload| Err(StageError::Panic(panic_message(payload.as_ref()))));
    if result.is_err() {
        frame.fail();
    }
    result
}

fn dispatch(
    stage: &dyn Stage,
    ctx: &StageContext,
    input: PhaseInput,
) -> Result<PhaseOutput, StageError> {
    match input {
        PhaseInput::Split { args } => stage.split(ctx, &args).map(PhaseOutput::StageDefs),
        PhaseInput::Main { args, mut outs } => {
            stage.main(ctx, &args, &mut outs)?;
            Ok(PhaseOutput::Outs(outs))
        }
        PhaseInput::Join { args, mut outs, chunks } => {
            stage.join(ctx, &args, &mut outs, &chunks)?;
            Ok(PhaseOutput::Outs(outs))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
