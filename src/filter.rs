//! Event filtering for -e kinds= expressions
//!
//! Supports:
//! - Individual kinds: -e kinds=call,native-call,raise
//! - Kind classes: -e kinds=calls, -e kinds=lines, -e kinds=raises
//! - Custom predicates supplied programmatically

use crate::event::{EventKind, TraceEvent};
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Predicate type for custom filters; must be pure and must not panic
pub type Predicate = Arc<dyn Fn(&TraceEvent) -> bool + Send + Sync>;

/// Decides which trace events a session formats
#[derive(Clone)]
pub struct EventFilter {
    mode: Mode,
}

#[derive(Clone)]
enum Mode {
    /// Accept events whose kind is in the set (None = all kinds)
    Kinds(Option<HashSet<EventKind>>),
    /// Opaque caller-supplied predicate
    Custom(Predicate),
}

impl EventFilter {
    /// Default policy: call and return events only
    pub fn default_kinds() -> Self {
        let kinds = [
            EventKind::Call,
            EventKind::NativeCall,
            EventKind::Return,
            EventKind::NativeReturn,
        ]
        .into_iter()
        .collect();
        Self {
            mode: Mode::Kinds(Some(kinds)),
        }
    }

    /// Create a filter that accepts every event
    pub fn all() -> Self {
        Self {
            mode: Mode::Kinds(None),
        }
    }

    /// Wrap an arbitrary predicate
    pub fn custom(pred: impl Fn(&TraceEvent) -> bool + Send + Sync + 'static) -> Self {
        Self {
            mode: Mode::Custom(Arc::new(pred)),
        }
    }

    /// Parse a filter expression like "kinds=call,return" or "kinds=calls"
    pub fn from_expr(expr: &str) -> Result<Self> {
        if let Some(spec) = expr.strip_prefix("kinds=") {
            Self::from_kinds_spec(spec)
        } else {
            bail!(
                "Invalid filter expression: {}. Expected format: kinds=SPEC",
                expr
            );
        }
    }

    /// Parse a kinds specification (the part after "kinds=")
    fn from_kinds_spec(spec: &str) -> Result<Self> {
        let mut kinds = HashSet::new();

        for part in spec.split(',') {
            let part = part.trim();

            match part {
                // All frame-push/pop kinds
                "calls" => {
                    kinds.extend([
                        EventKind::Call,
                        EventKind::NativeCall,
                        EventKind::Return,
                        EventKind::NativeReturn,
                    ]);
                }
                "lines" => {
                    kinds.insert(EventKind::Line);
                }
                "raises" => {
                    kinds.insert(EventKind::Raise);
                }
                "classes" => {
                    kinds.extend([EventKind::ClassOpen, EventKind::ClassClose]);
                }
                // Individual kind names
                "call" => {
                    kinds.insert(EventKind::Call);
                }
                "native-call" => {
                    kinds.insert(EventKind::NativeCall);
                }
                "return" => {
                    kinds.insert(EventKind::Return);
                }
                "native-return" => {
                    kinds.insert(EventKind::NativeReturn);
                }
                "class-open" => {
                    kinds.insert(EventKind::ClassOpen);
                }
                "class-close" => {
                    kinds.insert(EventKind::ClassClose);
                }
                "line" => {
                    kinds.insert(EventKind::Line);
                }
                "raise" => {
                    kinds.insert(EventKind::Raise);
                }
                other => bail!("Unknown event kind or class: {}", other),
            }
        }

        Ok(Self {
            mode: Mode::Kinds(Some(kinds)),
        })
    }

    /// Check whether an event should be formatted
    pub fn accepts(&self, event: &TraceEvent) -> bool {
        match &self.mode {
            Mode::Kinds(None) => true,
            Mode::Kinds(Some(set)) => set.contains(&event.kind),
            Mode::Custom(pred) => pred(event),
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::default_kinds()
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mode {
            Mode::Kinds(None) => write!(f, "EventFilter(all)"),
            Mode::Kinds(Some(set)) => write!(f, "EventFilter({:?})", set),
            Mode::Custom(_) => write!(f, "EventFilter(custom)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TraceEvent;

    fn ev(kind: EventKind) -> TraceEvent {
        TraceEvent::bare(kind, "main.rb", 1)
    }

    #[test]
    fn test_default_accepts_calls_and_returns_only() {
        let filter = EventFilter::default_kinds();
        assert!(filter.accepts(&ev(EventKind::Call)));
        assert!(filter.accepts(&ev(EventKind::NativeCall)));
        assert!(filter.accepts(&ev(EventKind::Return)));
        assert!(filter.accepts(&ev(EventKind::NativeReturn)));
        assert!(!filter.accepts(&ev(EventKind::Line)));
        assert!(!filter.accepts(&ev(EventKind::Raise)));
        assert!(!filter.accepts(&ev(EventKind::ClassOpen)));
        assert!(!filter.accepts(&ev(EventKind::ClassClose)));
    }

    #[test]
    fn test_filter_all_accepts_everything() {
        let filter = EventFilter::all();
        assert!(filter.accepts(&ev(EventKind::Line)));
        assert!(filter.accepts(&ev(EventKind::ClassOpen)));
        assert!(filter.accepts(&ev(EventKind::Raise)));
    }

    #[test]
    fn test_filter_individual_kinds() {
        let filter = EventFilter::from_expr("kinds=call,raise").unwrap();
        assert!(filter.accepts(&ev(EventKind::Call)));
        assert!(filter.accepts(&ev(EventKind::Raise)));
        assert!(!filter.accepts(&ev(EventKind::NativeCall)));
        assert!(!filter.accepts(&ev(EventKind::Return)));
    }

    #[test]
    fn test_filter_calls_class() {
        let filter = EventFilter::from_expr("kinds=calls").unwrap();
        assert!(filter.accepts(&ev(EventKind::Call)));
        assert!(filter.accepts(&ev(EventKind::NativeCall)));
        assert!(filter.accepts(&ev(EventKind::Return)));
        assert!(filter.accepts(&ev(EventKind::NativeReturn)));
        assert!(!filter.accepts(&ev(EventKind::Line)));
    }

    #[test]
    fn test_filter_classes_class() {
        let filter = EventFilter::from_expr("kinds=classes").unwrap();
        assert!(filter.accepts(&ev(EventKind::ClassOpen)));
        assert!(filter.accepts(&ev(EventKind::ClassClose)));
        assert!(!filter.accepts(&ev(EventKind::Call)));
    }

    #[test]
    fn test_filter_mixed_classes_and_kinds() {
        let filter = EventFilter::from_expr("kinds=calls,raise").unwrap();
        assert!(filter.accepts(&ev(EventKind::Call)));
        assert!(filter.accepts(&ev(EventKind::Raise)));
        assert!(!filter.accepts(&ev(EventKind::Line)));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(EventFilter::from_expr("invalid").is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = EventFilter::from_expr("kinds=bogus");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bogus"));
    }

    #[test]
    fn test_whitespace_handling() {
        let filter = EventFilter::from_expr("kinds=call, return , line").unwrap();
        assert!(filter.accepts(&ev(EventKind::Call)));
        assert!(filter.accepts(&ev(EventKind::Return)));
        assert!(filter.accepts(&ev(EventKind::Line)));
        assert!(!filter.accepts(&ev(EventKind::NativeCall)));
    }

    #[test]
    fn test_custom_predicate() {
        let filter = EventFilter::custom(|e| e.location == "combat.rb");
        let mut hit = ev(EventKind::Line);
        hit.location = "combat.rb".to_string();
        assert!(filter.accepts(&hit));
        assert!(!filter.accepts(&ev(EventKind::Call)));
    }

    #[test]
    fn test_filter_clone() {
        let filter = EventFilter::from_expr("kinds=call").unwrap();
        let clone = filter.clone();
        assert!(clone.accepts(&ev(EventKind::Call)));
        assert!(!clone.accepts(&ev(EventKind::Return)));
    }

    #[test]
    fn test_filter_debug() {
        let debug_str = format!("{:?}", EventFilter::all());
        assert!(debug_str.contains("EventFilter"));
    }
}
