// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Split phase specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn split_writes_stage_defs_and_completes() {
    let ps = Pipestance::new();
    let stage = ps.stage(
        "sort",
        r#"cat > /dev/null; echo '{"chunks": [{"n": 1}, {"n": 2}]}'"#,
    );

    ps.adapter("split", &stage).passes();

    assert_eq!(
        ps.json("stage_defs"),
        json!({"chunks": [{"n": 1}, {"n": 2}]})
    );
    assert!(ps.entry("complete").is_some());
    assert!(ps.entry("errors").is_none());
    assert!(ps.has_marker("split_stage_defs"));
    assert!(ps.has_marker("split_complete"));
}

#[test]
fn split_with_no_chunks_still_completes() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", r#"cat > /dev/null; echo '{"chunks": []}'"#);

    ps.adapter("split", &stage).passes();

    assert_eq!(ps.json("stage_defs"), json!({"chunks": []}));
    let info = ps.json("jobinfo");
    assert!(info["wallclock"]["duration_seconds"].as_f64().unwrap() >= 0.0);
    assert!(info["rusage"]["self"]["ru_maxrss"].is_i64());
    assert_eq!(info["name"], "SORT_READS");
    assert!(info["runtime"]["version"].as_str().unwrap().starts_with("stage-adapter "));
}

#[test]
fn stage_receives_reserved_fields_and_args() {
    let ps = Pipestance::new();
    ps.write_entry("args", &json!({"threads": 4}));
    let stage = ps.stage("sort", r#"cat > request.json; echo '{"chunks": []}'"#);

    ps.adapter("split", &stage).passes();

    let raw = std::fs::read_to_string(ps.files().join("request.json")).unwrap();
    let request: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        request,
        json!({"args": {
            "__invocation__": {"call": "SORT_READS", "args": {"reads": "in.fq"}},
            "__version__": {"pipeline": "1.0"},
            "threads": 4,
        }})
    );
}

#[test]
fn journal_log_brackets_the_run() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", r#"cat > /dev/null; echo '{"chunks": []}'"#);

    ps.adapter("split", &stage).passes();

    let log = ps.entry("log").unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert!(
        lines.first().unwrap().ends_with("[time] __start__"),
        "{log}"
    );
    assert!(lines.last().unwrap().ends_with("[time] __end__"), "{log}");
    assert!(log.contains("[exec] "));
}
