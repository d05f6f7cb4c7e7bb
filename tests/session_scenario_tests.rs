//! End-to-end scenarios through the library API
//!
//! Drives full sessions over a subscriber slot the way an embedding host
//! would, checking output shape and lifecycle guarantees.

use huella::event::{EventKind, TraceEvent};
use huella::instrument::{InstrumentationTarget, Instrumentor, MethodRegistry, Scope};
use huella::session::{SubscriberSlot, TraceSession};
use std::sync::{Arc, Mutex};

fn call(method: &str, owner: &str) -> TraceEvent {
    TraceEvent::new(EventKind::Call, "main.rb", 1, method, owner)
}

fn ret() -> TraceEvent {
    TraceEvent::bare(EventKind::Return, "main.rb", 2)
}

fn collecting_session() -> (TraceSession, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let session =
        TraceSession::new().with_sink(move |line| captured.lock().unwrap().push(line.to_string()));
    (session, lines)
}

#[test]
fn test_nested_call_return_sequence() {
    // [Call(f), Call(g), Return, Return]: two lines, second one space
    // deeper, depth back to 0
    let slot = SubscriberSlot::new();
    let (mut session, lines) = collecting_session();
    session.start(&slot);

    slot.emit(&call("f", "Main"));
    slot.emit(&call("g", "Main"));
    slot.emit(&ret());
    slot.emit(&ret());

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 2);
    let first = lines[0].find("Main.f").unwrap();
    let second = lines[1].find("Main.g").unwrap();
    assert_eq!(second, first + 1);
    assert_eq!(session.depth(), 0);
}

#[test]
fn test_start_stop_leaves_clean_slot() {
    let slot = SubscriberSlot::new();
    let (mut session, _lines) = collecting_session();

    assert!(session.start(&slot));
    assert!(session.stop(&slot));
    assert!(!slot.is_subscribed());
    assert_eq!(session.depth(), 0);

    assert!(session.stop(&slot));
    assert!(session.stop(&slot));
}

#[test]
fn test_events_after_stop_are_dropped() {
    let slot = SubscriberSlot::new();
    let (mut session, lines) = collecting_session();
    session.start(&slot);
    slot.emit(&call("f", "Main"));
    session.stop(&slot);
    slot.emit(&call("g", "Main"));

    assert_eq!(lines.lock().unwrap().len(), 1);
}

#[test]
fn test_failing_instrumented_method_leaves_tracer_stopped() {
    // Wrap a target, make it fail partway, confirm the session was torn
    // down and a fresh start begins at depth 0
    let source = Arc::new(SubscriberSlot::new());
    let mut registry = MethodRegistry::new();

    let emitter = Arc::clone(&source);
    registry.register(
        Scope::Instance,
        "Scene_Battle",
        "update",
        Box::new(move || {
            emitter.emit(&TraceEvent::new(
                EventKind::Call,
                "main.rb",
                5,
                "attack",
                "Enemy",
            ));
            anyhow::bail!("script error mid-call")
        }),
    );

    let mut instrumentor = Instrumentor::new(
        source.clone(),
        vec![InstrumentationTarget::new("Scene_Battle", "update")],
    )
    .with_session_factory(|| TraceSession::new().with_sink(|_| {}));
    assert_eq!(instrumentor.install(&mut registry), 1);

    let result = registry.invoke("Scene_Battle", "update");
    assert!(result.is_err());
    assert!(!source.is_subscribed());

    let (mut session, _lines) = collecting_session();
    assert!(session.start(source.as_ref()));
    assert_eq!(session.depth(), 0);
}

#[test]
fn test_superseding_session_takes_over_the_slot() {
    let slot = SubscriberSlot::new();
    let (mut old, old_lines) = collecting_session();
    let (mut new, new_lines) = collecting_session();

    old.start(&slot);
    slot.emit(&call("f", "Main"));

    // Last writer wins on the single subscription slot
    new.start(&slot);
    slot.emit(&call("g", "Main"));

    assert_eq!(old_lines.lock().unwrap().len(), 1);
    assert_eq!(new_lines.lock().unwrap().len(), 1);
    assert!(new_lines.lock().unwrap()[0].contains("Main.g"));
}
