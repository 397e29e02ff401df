// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter setup failure specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn missing_stage_is_recorded_and_exits_one() {
    let ps = Pipestance::new();
    let missing = ps.path().join("no_such_stage");

    ps.adapter("split", &missing).fails_with(1).stderr_has("StageNotFound");

    let errors = ps.entry("errors").unwrap();
    assert!(
        errors.contains("StageNotFound: no stage found at"),
        "{errors}"
    );
    assert!(ps.json("jobinfo")["wallclock"].is_object());
    assert!(ps.entry("complete").is_none());
}

#[test]
fn missing_reserved_job_info_is_recorded_and_finalized() {
    let ps = Pipestance::new();
    ps.job_info(json!({"version": {}}));
    let stage = ps.stage("sort", "echo '{}'");

    ps.adapter("split", &stage).fails_with(1).stderr_has("'invocation'");

    assert!(ps.entry("stage_defs").is_none());
    let errors = ps.entry("errors").unwrap();
    assert!(errors.contains("MissingJobInfo: job info is missing required field 'invocation'"));
    let info = ps.json("jobinfo");
    assert!(info["wallclock"].is_object());
    assert!(info["rusage"]["children"].is_object());
    assert!(ps.entry("log").unwrap().contains("[time] __end__"));
}

#[test]
fn missing_metadata_dir_exits_one() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "echo '{}'");
    std::fs::remove_dir_all(ps.meta()).unwrap();

    ps.adapter("split", &stage).fails_with(1).stderr_has("metadata directory");
}

#[test]
fn job_info_is_augmented_before_the_stage_runs() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; echo '{\"chunks\": []}'");

    ps.adapter("split", &stage).env("SGE_ARCH", "lx-amd64").env("JOB_ID", "4242").passes();

    let info = ps.json("jobinfo");
    assert_eq!(info["cwd"], json!(ps.files()));
    assert!(info["host"].is_string());
    assert!(info["pid"].is_u64());
    assert_eq!(info["cluster_env"]["jobid"], "4242");
}
