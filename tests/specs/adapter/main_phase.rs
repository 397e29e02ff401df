// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Main (chunk) phase specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn main_merges_printed_fields_into_outs() {
    let ps = Pipestance::new();
    ps.write_entry("args", &json!({"n": 1}));
    ps.write_entry("outs", &json!({"sorted": null, "index": null}));
    let stage = ps.stage(
        "sort",
        r#"cat > request.json; echo '{"sorted": "sorted.bam"}'"#,
    );

    ps.adapter("main", &stage).passes();

    assert_eq!(
        ps.json("outs"),
        json!({"sorted": "sorted.bam", "index": null})
    );
    let raw = std::fs::read_to_string(ps.files().join("request.json")).unwrap();
    let request: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(request["outs"], json!({"sorted": null, "index": null}));
    assert_eq!(request["args"]["n"], 1);
}

#[test]
fn main_markers_are_unprefixed() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null");

    ps.adapter("main", &stage).passes();

    assert!(ps.has_marker("complete"));
    assert!(ps.has_marker("stdout"));
    assert!(ps.has_marker("stderr"));
    assert!(!ps.has_marker("main_complete"));
}

#[test]
fn non_object_result_fails_the_run() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; echo '[1, 2]'");

    ps.adapter("main", &stage).fails_with(1);

    let errors = ps.entry("errors").unwrap();
    assert!(
        errors.contains("Throw: stage printed a non-object result: [1,2]"),
        "{errors}"
    );
}
