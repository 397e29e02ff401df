// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profiling specs

use crate::prelude::*;

#[test]
fn memory_mode_writes_mprofile() {
    let ps = Pipestance::new();
    ps.job_info(json!({"invocation": {}, "version": {}, "profile_mode": "mem"}));
    let stage = ps.stage("sort", "cat > /dev/null; echo '{\"chunks\": []}'");

    ps.adapter("split", &stage).passes();

    let report = ps.entry("mprofile").unwrap();
    assert!(report.starts_with("ncalls"), "{report}");
    assert!(report.contains("(split) <--- "), "{report}");
}

#[test]
fn cpu_mode_writes_profile_and_compressed_stats() {
    let ps = Pipestance::new();
    ps.job_info(json!({"invocation": {}, "version": {}, "profile_mode": "cpu"}));
    let stage = ps.stage("sort", "cat > /dev/null; echo '{\"chunks\": []}'");

    ps.adapter("split", &stage).passes();

    assert!(ps.entry("profile").unwrap().contains("Ordered by: cumulative time"));
    let bytes = std::fs::read(ps.meta().join("_profile_full")).unwrap();
    let raw = zstd::decode_all(bytes.as_slice()).unwrap();
    let stats: Value = serde_json::from_slice(&raw).unwrap();
    assert!(stats["total_calls"].as_u64().unwrap() >= 1);
}

#[test]
fn disabled_mode_writes_no_profile() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; echo '{\"chunks\": []}'");

    ps.adapter("split", &stage).passes();

    assert!(ps.entry("mprofile").is_none());
    assert!(ps.entry("profile").is_none());
}
