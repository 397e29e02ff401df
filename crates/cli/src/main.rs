// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stage-adapter: run one phase of a pipeline stage under the orchestrator

mod exit_error;
mod logging;

use anyhow::Context;
use clap::Parser;
use exit_error::ExitError;
use sa_core::Invocation;
use sa_engine::{env, run_invocation, AdapterOptions, Outcome, StageRegistry};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "stage-adapter",
    version = env::ADAPTER_VERSION,
    about = "Run one phase of a pipeline stage and record it in the metadata journal"
)]
struct Cli {
    /// Runner path; its file name selects the phase (split.sh, main.sh, join.sh)
    runner: PathBuf,
    /// Stage code: a registered stage name or an executable stage program
    stage_code: String,
    /// Directory holding the metadata journal
    metadata_dir: PathBuf,
    /// Directory the stage writes output files into
    files_dir: PathBuf,
    /// Run file; freshness markers are written next to it
    run_file: PathBuf,
}

impl Cli {
    fn into_invocation(self) -> Invocation {
        Invocation {
            runner: self.runner,
            stage_code: self.stage_code,
            metadata_dir: self.metadata_dir,
            files_dir: self.files_dir,
            run_file: self.run_file,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("stage-adapter: {e:#}");
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("stage-adapter: {exit}");
                exit.exit_code()
            }
            None => {
                eprintln!("stage-adapter: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("sa-heartbeat")
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let invocation = cli.into_invocation();
    let registry = StageRegistry::new();
    let options = AdapterOptions::from_env();
    let outcome = run_invocation(&invocation, &registry, runtime.handle(), &options)
        .map_err(ExitError::from)?;

    match outcome {
        Outcome::Completed | Outcome::Exited => Ok(()),
        Outcome::Failed => Err(ExitError::new(
            1,
            format!(
                "stage failed; see {}",
                invocation.metadata_dir.join("_errors").display()
            ),
        )
        .into()),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
