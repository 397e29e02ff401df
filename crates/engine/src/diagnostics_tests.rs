// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::StageError;
use crate::stage::BOOTSTRAP_FILE;
use crate::trace::{CallSite, Tracer};

/// Two adapter frames, the phase bootstrap, then two stage frames, all failed.
fn failed_chain() -> Vec<TraceFrame> {
    let tracer = Tracer::new();
    let mut guards = Vec::new();

    guards.push(tracer.enter(CallSite::new("adapter/lifecycle.rs", 40, "run")));
    tracer.record_local("adapter_secret", Some("1".into()));
    guards.push(tracer.enter(CallSite::new("adapter/profile.rs", 12, "main")));
    tracer.record_local("hook", Some("memory".into()));
    guards.push(tracer.enter(CallSite::new(BOOTSTRAP_FILE, 100, "split")));
    tracer.record_local("args", Some(r#"{"reads":"in.fq"}"#.into()));
    guards.push(tracer.enter(CallSite::new("stages/sort.rs", 20, "load")));
    tracer.record_local("path", Some(r#""in.fq""#.into()));
    tracer.record_local("handle", None);
    guards.push(tracer.enter(CallSite::new("stages/sort.rs", 31, "parse_record")));
    tracer.record_local("line_no", Some("7".into()));

    while let Some(mut guard) = guards.pop() {
        guard.fail();
    }
    tracer.take_unwound()
}

#[test]
fn trace_lists_frames_outermost_first_then_error() {
    let frames = failed_chain();
    let error = StageError::throw("bad input");
    let report = format_trace(&frames, error.kind(), &error);
    let lines: Vec<&str> = report.lines().filter(|l| l.starts_with("  at ")).collect();

    assert!(report.starts_with("Call chain (innermost last):\n"));
    assert_eq!(
        lines,
        vec![
            "  at adapter/lifecycle.rs:40 in run".to_string(),
            "  at adapter/profile.rs:12 in main".to_string(),
            format!("  at {BOOTSTRAP_FILE}:100 in split"),
            "  at stages/sort.rs:20 in load".to_string(),
            "  at stages/sort.rs:31 in parse_record".to_string(),
        ]
    );
    assert!(report.ends_with("Throw: bad input\n"));
    assert!(!report.contains(" = "));
}

#[test]
fn stackvars_dumps_locals_from_the_bootstrap_inward() {
    let frames = failed_chain();
    let error = StageError::throw("bad input");
    let report = format_stackvars(&frames, error.kind(), &error);
    let locals: Vec<&str> = report.lines().filter(|l| l.starts_with("        ")).collect();

    assert_eq!(
        locals,
        vec![
            r#"        args = {"reads":"in.fq"}"#,
            r#"        path = "in.fq""#,
            "        line_no = 7",
        ]
    );
    assert!(!report.contains("adapter_secret"));
    assert!(!report.contains("hook = "));
    assert!(!report.contains("handle"));
}

#[test]
fn stackvars_without_bootstrap_has_no_locals() {
    let tracer = Tracer::new();
    {
        let mut guard = tracer.enter(CallSite::new("stages/sort.rs", 5, "main"));
        tracer.record_local("x", Some("1".into()));
        guard.fail();
    }
    let frames = tracer.take_unwound();
    let error = StageError::Panic("boom".into());
    let report = format_stackvars(&frames, error.kind(), &error);
    assert!(!report.contains("x = 1"));
    assert!(report.ends_with("Panic: boom\n"));
}

#[test]
fn causes_are_listed_after_the_error() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let journal = sa_storage::JournalError::Io {
        path: "/meta/_outs".into(),
        source: io,
    };
    let error = StageError::from(journal);
    let report = format_trace(&[], error.kind(), &error);

    assert_eq!(
        report,
        "Call chain (innermost last):\n\
         Error: failed to write /meta/_outs: denied\n\
         caused by: denied\n"
    );
}
