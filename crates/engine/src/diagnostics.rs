// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure reports written to the `errors` and `stackvars` entries.

use std::error::Error;
use std::fmt::Write as _;

use crate::stage::is_bootstrap;
use crate::trace::TraceFrame;

const HEADER: &str = "Call chain (innermost last):";

/// The `errors` report: the call chain followed by the error and its causes.
pub fn format_trace(frames: &[TraceFrame], kind: &str, error: &(dyn Error + 'static)) -> String {
    render(frames, kind, error, false)
}

/// The `stackvars` report.
///
/// Like [`format_trace`], but from the phase bootstrap frame inward each
/// frame also lists its recorded locals. Locals that could not be rendered
/// are left out.
pub fn format_stackvars(
    frames: &[TraceFrame],
    kind: &str,
    error: &(dyn Error + 'static),
) -> String {
    render(frames, kind, error, true)
}

fn render(
    frames: &[TraceFrame],
    kind: &str,
    error: &(dyn Error + 'static),
    with_locals: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    let mut in_stage = false;
    for frame in frames {
        let _ = writeln!(
            out,
            "  at {}:{} in {}",
            frame.site.file, frame.site.line, frame.site.name
        );
        if let Some(source) = frame.source_line() {
            let _ = writeln!(out, "    {source}");
        }
        in_stage = in_stage || is_bootstrap(frame);
        if with_locals && in_stage {
            for local in &frame.locals {
                if let Some(rendered) = &local.rendered {
                    let _ = writeln!(out, "        {} = {}", local.name, rendered);
                }
            }
        }
    }
    let _ = writeln!(out, "{kind}: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "caused by: {cause}");
        source = cause.source();
    }
    out
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
