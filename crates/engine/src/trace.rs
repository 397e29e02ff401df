// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instrumentation scopes around stage calls.
//!
//! Stage code opens a scope for each call it wants attributed (see
//! `StageContext::call`); the adapter opens one around the phase bootstrap.
//! The tracer keeps the live scope stack, reports call/return events to an
//! installed [`CallHook`] (the profilers), and keeps the chain of frames an
//! error or panic unwound through so diagnostics can walk it afterwards.

use parking_lot::Mutex;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Source location and function name of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub name: String,
}

impl CallSite {
    pub fn new(file: &'static str, line: u32, name: impl Into<String>) -> Self {
        Self {
            file,
            line,
            name: name.into(),
        }
    }

    /// Site at the caller's location.
    #[track_caller]
    pub fn here(name: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line(), name)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.file, self.line, self.name)
    }
}

/// A local variable snapshot recorded inside a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub name: String,
    /// `None` when the value could not be rendered.
    pub rendered: Option<String>,
}

/// One scope on the call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub site: CallSite,
    pub locals: Vec<Local>,
    depth: usize,
}

impl TraceFrame {
    /// Depth on the scope stack (0 = outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Source text of the frame's line, when the file is readable.
    pub fn source_line(&self) -> Option<String> {
        let index = usize::try_from(self.site.line).ok()?.checked_sub(1)?;
        let text = std::fs::read_to_string(self.site.file).ok()?;
        text.lines().nth(index).map(|line| line.trim().to_string())
    }
}

/// Observer of scope entry and exit. Profilers implement this.
pub trait CallHook: Send {
    fn on_call(&mut self, site: &CallSite, caller: Option<&CallSite>);
    fn on_return(&mut self, site: &CallSite, caller: Option<&CallSite>);
}

#[derive(Default)]
struct TracerState {
    stack: Vec<TraceFrame>,
    /// Frames left by the most recent error, innermost first.
    unwound: Vec<TraceFrame>,
    hook: Option<Arc<Mutex<dyn CallHook>>>,
}

/// Shared scope tracker. Cloning yields another handle to the same state.
#[derive(Clone, Default)]
pub struct Tracer {
    state: Arc<Mutex<TracerState>>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope. It closes when the returned guard drops.
    pub fn enter(&self, site: CallSite) -> FrameGuard {
        let (hook, caller) = {
            let mut state = self.state.lock();
            let depth = state.stack.len();
            // A new scope at this depth means earlier failures here were handled
            state.unwound.retain(|frame| frame.depth < depth);
            let caller = state.stack.last().map(|frame| frame.site.clone());
            state.stack.push(TraceFrame {
                site: site.clone(),
                locals: Vec::new(),
                depth,
            });
            (state.hook.clone(), caller)
        };
        if let Some(hook) = hook {
            hook.lock().on_call(&site, caller.as_ref());
        }
        FrameGuard {
            tracer: self.clone(),
            failed: false,
        }
    }

    /// Attach a local variable to the innermost open scope.
    pub fn record_local(&self, name: impl Into<String>, rendered: Option<String>) {
        let mut state = self.state.lock();
        if let Some(frame) = state.stack.last_mut() {
            frame.locals.push(Local {
                name: name.into(),
                rendered,
            });
        }
    }

    /// Route call/return events to `hook` until the guard drops.
    pub fn install(&self, hook: Arc<Mutex<dyn CallHook>>) -> HookGuard {
        self.state.lock().hook = Some(hook);
        HookGuard {
            tracer: self.clone(),
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.state.lock().stack.len()
    }

    /// Take the frames the last unhandled error passed through, outermost first.
    pub fn take_unwound(&self) -> Vec<TraceFrame> {
        let mut frames = std::mem::take(&mut self.state.lock().unwound);
        frames.reverse();
        frames
    }

    fn exit(&self, failed: bool) {
        let (hook, site, caller) = {
            let mut state = self.state.lock();
            let Some(frame) = state.stack.pop() else {
                return;
            };
            let caller = state.stack.last().map(|f| f.site.clone());
            let site = frame.site.clone();
            if failed {
                state.unwound.push(frame);
            } else {
                let depth = frame.depth;
                state.unwound.retain(|f| f.depth <= depth);
            }
            (state.hook.clone(), site, caller)
        };
        if let Some(hook) = hook {
            hook.lock().on_return(&site, caller.as_ref());
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Tracer")
            .field("depth", &state.stack.len())
            .field("unwound", &state.unwound.len())
            .field("hooked", &state.hook.is_some())
            .finish()
    }
}

/// Closes its scope on drop.
///
/// The frame joins the unwound chain when [`FrameGuard::fail`] was called or
/// when the thread is panicking.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct FrameGuard {
    tracer: Tracer,
    failed: bool,
}

impl FrameGuard {
    /// Mark the scope as exiting with an error.
    pub fn fail(&mut self) {
        self.failed = true;
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.tracer.exit(self.failed || std::thread::panicking());
    }
}

/// Removes the installed hook on drop.
#[must_use = "the hook is removed as soon as the guard is dropped"]
pub struct HookGuard {
    tracer: Tracer,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.tracer.state.lock().hook = None;
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
