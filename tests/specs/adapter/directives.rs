// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage requests sent through the control file

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn throw_message_reaches_errors() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", r#"echo "throw bad input" >> "$SA_CONTROL"; exit 1"#);

    ps.adapter("split", &stage).fails_with(1).stderr_has("stage failed");

    let errors = ps.entry("errors").unwrap();
    assert!(errors.ends_with("Throw: bad input\n"), "{errors}");
    assert!(errors.contains(" in sort\n"), "{errors}");
    assert!(ps.entry("complete").is_none());
    assert!(ps.json("jobinfo")["wallclock"].is_object());
}

#[test]
fn exit_request_writes_assert_and_succeeds() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", r#"echo "exit no reads to align" >> "$SA_CONTROL""#);

    ps.adapter("main", &stage).passes();

    assert_eq!(ps.entry("assert").as_deref(), Some("no reads to align"));
    assert!(ps.entry("complete").is_none());
    assert!(ps.entry("errors").is_none());
    assert!(ps.entry("outs").is_none());
}

#[test]
fn alarm_and_log_requests_are_journaled() {
    let ps = Pipestance::new();
    let stage = ps.stage(
        "sort",
        r#"cat > /dev/null
echo "log sorting 3 files" >> "$SA_CONTROL"
echo "alarm coverage below 10x" >> "$SA_CONTROL"
echo '{"chunks": []}'"#,
    );

    ps.adapter("split", &stage).passes();

    assert!(ps.entry("alarm").unwrap().ends_with("coverage below 10x\n"));
    let log = ps.entry("log").unwrap();
    assert!(log.contains("[info] sorting 3 files"), "{log}");
    assert!(log.contains("[alarm] coverage below 10x"), "{log}");
    assert!(ps.has_marker("split_alarm"));
}

#[test]
fn stderr_of_a_failed_program_reaches_errors() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "echo 'bad input' >&2; exit 1");

    ps.adapter("split", &stage).fails_with(1).stderr_has("bad input");

    let errors = ps.entry("errors").unwrap();
    assert!(
        errors.contains("exited with exit status: 1\nbad input"),
        "{errors}"
    );
}
