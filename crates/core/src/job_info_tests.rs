// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn unknown_orchestrator_fields_survive_round_trip() {
    let seeded = json!({
        "name": "ID.pipe.STAGE.fork0.split",
        "type": "local",
        "invocation": {"call": "PIPE"},
        "version": {"martian": "2.0"},
    });
    let mut info: JobInfo = serde_json::from_value(seeded).unwrap();
    info.pid = Some(42);

    let out = serde_json::to_value(&info).unwrap();
    assert_eq!(out["name"], "ID.pipe.STAGE.fork0.split");
    assert_eq!(out["type"], "local");
    assert_eq!(out["pid"], 42);
    assert!(out.get("wallclock").is_none());
}

#[test]
fn empty_object_parses_to_default() {
    let info: JobInfo = serde_json::from_value(json!({})).unwrap();
    assert_eq!(info, JobInfo::default());
}

#[test]
fn rusage_self_field_is_renamed() {
    let mut usage = ResourceUsage::default();
    usage.own.insert("ru_maxrss".into(), 1024);
    let value = serde_json::to_value(&usage).unwrap();
    assert_eq!(value["self"]["ru_maxrss"], 1024);
    assert!(value["children"].as_object().unwrap().is_empty());
}

#[yare::parameterized(
    disable = { "disable", ProfileMode::None },
    none = { "none", ProfileMode::None },
    cpu = { "cpu", ProfileMode::Cpu },
    profile = { "profile", ProfileMode::Cpu },
    mem = { "mem", ProfileMode::Memory },
    memory = { "memory", ProfileMode::Memory },
    garbage = { "perf", ProfileMode::None },
)]
fn profile_mode_parse(value: &str, expected: ProfileMode) {
    assert_eq!(ProfileMode::parse(value), expected);
}

#[test]
fn profile_mode_defaults_to_none() {
    assert_eq!(JobInfo::default().profile_mode(), ProfileMode::None);
}

#[yare::parameterized(
    stackvars = { json!("stackvars"), true },
    localvars = { json!("localvars"), true },
    disabled = { json!("disable"), false },
    bool_true = { json!(true), true },
    number = { json!(1), false },
)]
fn stackvars_flag_variants(flag: Value, expected: bool) {
    let info = JobInfo {
        stackvars_flag: Some(flag),
        ..JobInfo::default()
    };
    assert_eq!(info.stackvars_enabled(), expected);
}
