//! Indented trace line rendering with call-depth tracking
//!
//! Call events render as one line each, indented by the current depth;
//! return events render nothing and pop the depth. The depth counter is
//! clamped at zero so a tracer attached mid-stack never underflows on the
//! unmatched returns it sees first.

use crate::event::{EventKind, TraceEvent};
use crate::resolver::{resolve_location, ScriptMap};
use std::sync::Arc;

/// Mutable per-session formatter state: the current call depth
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterState {
    depth: usize,
}

impl FormatterState {
    /// Fresh state at depth 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reset depth to 0 (session start/stop)
    pub fn reset(&mut self) {
        self.depth = 0;
    }

    fn push(&mut self) {
        self.depth += 1;
    }

    /// Pop one frame, clamped at zero for unmatched returns
    fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Renders accepted events as indented text lines
#[derive(Debug, Clone, Default)]
pub struct TraceFormatter {
    /// Optional index → name table for `{N}` placeholder locations
    script_map: Option<Arc<ScriptMap>>,
    /// Also render Line events (off by default)
    show_lines: bool,
    /// Also render Raise events (off by default)
    show_raises: bool,
}

impl TraceFormatter {
    /// Formatter with default rendering and no script map
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a script map for placeholder resolution
    pub fn with_script_map(mut self, map: Arc<ScriptMap>) -> Self {
        self.script_map = Some(map);
        self
    }

    /// Render Line events with an `l` tag
    pub fn show_lines(mut self, on: bool) -> Self {
        self.show_lines = on;
        self
    }

    /// Render Raise events with an `E` tag
    pub fn show_raises(mut self, on: bool) -> Self {
        self.show_raises = on;
        self
    }

    /// Format one accepted event, updating depth
    ///
    /// Returns the rendered line for call events (and line/raise events when
    /// enabled), None for everything else. Call events indent by the depth
    /// at the time of the call and then push; return events pop silently.
    pub fn format(&self, event: &TraceEvent, state: &mut FormatterState) -> Option<String> {
        match event.kind {
            EventKind::Call | EventKind::NativeCall => {
                let line = self.render(event, state.depth());
                state.push();
                Some(line)
            }
            EventKind::Return | EventKind::NativeReturn => {
                state.pop();
                None
            }
            EventKind::Line if self.show_lines => Some(self.render(event, state.depth())),
            EventKind::Raise if self.show_raises => Some(self.render(event, state.depth())),
            _ => None,
        }
    }

    fn render(&self, event: &TraceEvent, depth: usize) -> String {
        let tag = match event.kind {
            // "C" marks native frames, "rb" interpreted ones
            EventKind::NativeCall => "C",
            EventKind::Call => "rb",
            EventKind::Line => "l",
            EventKind::Raise => "E",
            _ => "?",
        };
        let location = resolve_location(&event.location, self.script_map.as_deref());
        let indent = " ".repeat(depth);
        format!(
            "{:<2} {:>5} {:<20}  {}{}",
            tag,
            event.line,
            location,
            indent,
            qualified_name(event)
        )
    }
}

/// `Owner.method`, degrading gracefully when either side is empty
fn qualified_name(event: &TraceEvent) -> String {
    match (event.owner.is_empty(), event.method.is_empty()) {
        (false, false) => format!("{}.{}", event.owner, event.method),
        (false, true) => event.owner.clone(),
        (true, false) => event.method.clone(),
        (true, true) => "?".to_string(),
    }
}
