// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage failure specs

use crate::prelude::*;

#[test]
fn failing_stage_writes_errors_and_exits_one() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; echo 'bad input' >&2; exit 3");

    ps.adapter("split", &stage).fails_with(1).stderr_has("stage failed");

    let errors = ps.entry("errors").unwrap();
    assert!(
        errors.starts_with("Call chain (innermost last):\n"),
        "{errors}"
    );
    assert!(errors.contains("CommandFailed: command `"), "{errors}");
    assert!(errors.contains("exited with exit status: 3"), "{errors}");
    assert!(ps.entry("complete").is_none());
    assert!(ps.entry("stage_defs").is_none());
    assert!(ps.json("jobinfo")["wallclock"].is_object());
}

#[test]
fn stackvars_written_only_when_requested() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "exit 1");

    ps.adapter("split", &stage).fails_with(1);
    assert!(ps.entry("stackvars").is_none());

    ps.job_info(json!({"invocation": {}, "version": {}, "stackvars_flag": "stackvars"}));
    ps.adapter("split", &stage).fails_with(1);
    let stackvars = ps.entry("stackvars").unwrap();
    assert!(stackvars.contains("        args = {"), "{stackvars}");
}

#[test]
fn invalid_json_output_is_a_failure() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; echo 'not json'");

    ps.adapter("split", &stage).fails_with(1);

    assert!(ps.entry("errors").unwrap().contains("InvalidData: invalid stage data: "));
}
