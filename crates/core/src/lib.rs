// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sa-core: Domain types shared by the stage adapter crates

pub mod macros;

pub mod args;
pub mod clock;
pub mod invocation;
pub mod job_info;
pub mod phase;
pub mod time_fmt;

pub use args::{StageArgs, INVOCATION_FIELD, VERSION_FIELD};
pub use clock::{Clock, FakeClock, SystemClock};
pub use invocation::{Invocation, InvocationError};
pub use job_info::{ClusterEnv, JobInfo, ProfileMode, ResourceUsage, RuntimeInfo, Wallclock};
pub use phase::{Phase, RunTag};
pub use time_fmt::{duration_seconds, format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
