//! Trace event records delivered by an event source
//!
//! Replaces the positional six-tuple the embedding runtime hands to its
//! trace callback with a named, typed record. Events are immutable: the
//! source produces them, the session formats them, nothing mutates them.

use serde::{Deserialize, Serialize};

/// The kind of execution step an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Interpreted method call
    Call,
    /// Call into a native (host-provided) method
    NativeCall,
    /// Return from an interpreted method
    Return,
    /// Return from a native method
    NativeReturn,
    /// Class/module body opened
    ClassOpen,
    /// Class/module body closed
    ClassClose,
    /// Source line executed
    Line,
    /// Exception raised
    Raise,
}

impl EventKind {
    /// True for the kinds that push a new frame (Call, NativeCall)
    pub fn is_call(self) -> bool {
        matches!(self, EventKind::Call | EventKind::NativeCall)
    }

    /// True for the kinds that pop a frame (Return, NativeReturn)
    pub fn is_return(self) -> bool {
        matches!(self, EventKind::Return | EventKind::NativeReturn)
    }
}

/// A single execution-trace notification
///
/// `location` is whatever unit identifier the runtime reports, typically a
/// file path or a `{N}` script-index placeholder (see `resolver`).
/// `method` and `owner` may be empty when the runtime has nothing to report
/// (e.g. top-level code outside any method).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: EventKind,
    pub location: String,
    pub line: u32,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub owner: String,
}

impl TraceEvent {
    /// Build an event with all fields populated
    pub fn new(
        kind: EventKind,
        location: impl Into<String>,
        line: u32,
        method: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            line,
            method: method.into(),
            owner: owner.into(),
        }
    }

    /// Build an event with no method/owner attribution (returns, lines)
    pub fn bare(kind: EventKind, location: impl Into<String>, line: u32) -> Self {
        Self::new(kind, location, line, "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_call_predicates() {
        assert!(EventKind::Call.is_call());
        assert!(EventKind::NativeCall.is_call());
        assert!(!EventKind::Return.is_call());
        assert!(!EventKind::Line.is_call());

        assert!(EventKind::Return.is_return());
        assert!(EventKind::NativeReturn.is_return());
        assert!(!EventKind::Call.is_return());
        assert!(!EventKind::Raise.is_return());
    }

    #[test]
    fn test_event_constructors() {
        let ev = TraceEvent::new(EventKind::Call, "main.rb", 10, "update", "Player");
        assert_eq!(ev.kind, EventKind::Call);
        assert_eq!(ev.location, "main.rb");
        assert_eq!(ev.line, 10);
        assert_eq!(ev.method, "update");
        assert_eq!(ev.owner, "Player");

        let ret = TraceEvent::bare(EventKind::Return, "main.rb", 12);
        assert!(ret.method.is_empty());
        assert!(ret.owner.is_empty());
    }

    #[test]
    fn test_event_json_round_trip() {
        let ev = TraceEvent::new(EventKind::NativeCall, "{2}", 55, "draw", "Sprite");
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("native-call"));
        let back: TraceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_event_json_defaults_optional_fields() {
        // Return events recorded without attribution still parse
        let json = r#"{"kind":"return","location":"main.rb","line":3}"#;
        let ev: TraceEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.kind, EventKind::Return);
        assert!(ev.method.is_empty());
        assert!(ev.owner.is_empty());
    }
}
