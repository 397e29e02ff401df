// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sa-engine: Runs one phase of a stage and records the outcome in the journal

pub mod context;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod heartbeat;
pub mod job_info;
pub mod lifecycle;
pub mod profile;
pub mod stage;
pub mod trace;
pub mod usage;

pub use context::StageContext;
pub use diagnostics::{format_stackvars, format_trace};
pub use error::{AdapterError, StageError};
pub use heartbeat::Heartbeat;
pub use lifecycle::{run_invocation, Adapter, AdapterOptions, LifecycleState, Outcome};
pub use profile::{CpuProfile, MemoryProfile, Profiler};
pub use stage::{
    ExecStage, JoinInputs, PhaseInput, PhaseOutput, Stage, StageLoader, StageRegistry,
};
pub use trace::{CallHook, CallSite, FrameGuard, HookGuard, Local, TraceFrame, Tracer};
