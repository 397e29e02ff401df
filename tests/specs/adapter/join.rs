// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Join phase specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn join_receives_chunk_defs_and_outs() {
    let ps = Pipestance::new();
    ps.write_entry("outs", &json!({"merged": null}));
    ps.write_entry("chunk_defs", &json!([{"n": 1}, {"n": 2}]));
    ps.write_entry("chunk_outs", &json!([{"part": "a.bam"}, {"part": "b.bam"}]));
    let stage = ps.stage(
        "sort",
        r#"cat > request.json; echo '{"merged": "all.bam"}'"#,
    );

    ps.adapter("join", &stage).passes();

    assert_eq!(ps.json("outs"), json!({"merged": "all.bam"}));
    let raw = std::fs::read_to_string(ps.files().join("request.json")).unwrap();
    let request: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(request["chunk_defs"], json!([{"n": 1}, {"n": 2}]));
    assert_eq!(
        request["chunk_outs"],
        json!([{"part": "a.bam"}, {"part": "b.bam"}])
    );
    assert!(ps.has_marker("join_outs"));
}
