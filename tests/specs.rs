// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `stage-adapter` binary.
//!
//! Each spec builds a metadata journal in a temp dir, runs the binary against
//! a shell-script stage, and checks the journal it leaves behind.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

mod specs {
    mod adapter {
        mod directives;
        mod failure;
        mod heartbeat;
        mod join;
        mod main_phase;
        mod profile;
        mod setup;
        mod split;
    }
    mod cli {
        mod help;
    }
}
