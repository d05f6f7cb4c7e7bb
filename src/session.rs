//! Trace session lifecycle and the event-source boundary
//!
//! A `TraceSession` binds a filter/formatter pair to an `EventSource` and
//! manages the subscribe/unsubscribe lifecycle. Sessions are strictly
//! best-effort diagnostics: subscription failures are logged and surfaced
//! as `false`, never propagated, so tracing can never take the host down.
//!
//! The runtime hook that would physically deliver events is out of scope;
//! `SubscriberSlot` is the reference source, an explicit object holding the
//! one process-wide subscriber slot that such runtimes expose.

use crate::event::TraceEvent;
use crate::filter::EventFilter;
use crate::formatter::{FormatterState, TraceFormatter};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::warn;

/// Callback invoked for every traced execution step
pub type Subscriber = Box<dyn FnMut(&TraceEvent) + Send>;

/// Errors an event source may report; always swallowed at the session boundary
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source cannot accept subscribers in the current context
    #[error("event source does not support subscription in this context")]
    Unsupported,
    /// The source rejected the operation
    #[error("event source rejected the request: {0}")]
    Rejected(String),
}

/// Registration point for the single process-wide trace subscriber
///
/// Subscribing while a subscriber is installed replaces it (last-writer-wins,
/// matching runtimes that expose a single global trace-callback slot).
/// Unsubscribing when empty is a no-op.
pub trait EventSource {
    fn subscribe(&self, subscriber: Subscriber) -> Result<(), SourceError>;
    fn unsubscribe(&self) -> Result<(), SourceError>;
}

/// Reference `EventSource`: one mutex-guarded subscriber slot plus `emit`
///
/// Doubles as the delivery mechanism for replayed trace files and as the
/// test harness for everything downstream of the runtime hook.
#[derive(Default)]
pub struct SubscriberSlot {
    slot: Mutex<Option<Subscriber>>,
}

impl SubscriberSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one event to the current subscriber, if any
    pub fn emit(&self, event: &TraceEvent) {
        if let Some(subscriber) = lock(&self.slot).as_mut() {
            subscriber(event);
        }
    }

    /// Whether a subscriber is currently installed
    pub fn is_subscribed(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

impl EventSource for SubscriberSlot {
    fn subscribe(&self, subscriber: Subscriber) -> Result<(), SourceError> {
        *lock(&self.slot) = Some(subscriber);
        Ok(())
    }

    fn unsubscribe(&self) -> Result<(), SourceError> {
        *lock(&self.slot) = None;
        Ok(())
    }
}

/// Lock a mutex, recovering the data on poisoning
///
/// A subscriber that panicked mid-event must not wedge the slot for the
/// rest of the process.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Where formatted trace lines go
type Sink = Arc<Mutex<Box<dyn FnMut(&str) + Send>>>;

fn stdout_sink() -> Sink {
    let print: Box<dyn FnMut(&str) + Send> = Box::new(|line: &str| println!("{}", line));
    Arc::new(Mutex::new(print))
}

/// Lifecycle manager binding a filter/formatter pair to an event source
///
/// States: idle → active → stopped. `stop` is idempotent; starting while
/// active simply replaces the previous subscription in the source's single
/// slot. Both transitions reset the depth counter to zero.
pub struct TraceSession {
    filter: EventFilter,
    formatter: TraceFormatter,
    state: Arc<Mutex<FormatterState>>,
    sink: Sink,
    active: bool,
}

impl TraceSession {
    /// Session with the default filter/formatter, printing to stdout
    pub fn new() -> Self {
        Self {
            filter: EventFilter::default_kinds(),
            formatter: TraceFormatter::new(),
            state: Arc::new(Mutex::new(FormatterState::new())),
            sink: stdout_sink(),
            active: false,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_formatter(mut self, formatter: TraceFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Redirect formatted lines away from stdout (tests, embedding hosts)
    pub fn with_sink(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        let sink: Box<dyn FnMut(&str) + Send> = Box::new(sink);
        self.sink = Arc::new(Mutex::new(sink));
        self
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        lock(&self.state).depth()
    }

    /// Whether this session currently holds a subscription
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reset depth and install this session as the source's subscriber
    ///
    /// Returns false (after logging) if the source refuses the subscription;
    /// no subscription is left active in that case.
    pub fn start(&mut self, source: &dyn EventSource) -> bool {
        lock(&self.state).reset();

        let filter = self.filter.clone();
        let formatter = self.formatter.clone();
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);

        let subscriber: Subscriber = Box::new(move |event: &TraceEvent| {
            if !filter.accepts(event) {
                return;
            }
            let line = {
                let mut state = lock(&state);
                formatter.format(event, &mut state)
            };
            if let Some(line) = line {
                let mut emit = lock(&sink);
                (*emit)(&line);
            }
        });

        match source.subscribe(subscriber) {
            Ok(()) => {
                self.active = true;
                true
            }
            Err(e) => {
                warn!("trace session not started: {}", e);
                self.active = false;
                false
            }
        }
    }

    /// Reset depth and remove the subscription
    ///
    /// Idempotent: stopping an idle or already-stopped session is a no-op
    /// returning true. A failed removal is logged and reported as false.
    pub fn stop(&mut self, source: &dyn EventSource) -> bool {
        lock(&self.state).reset();

        if !self.active {
            return true;
        }
        self.active = false;

        match source.unsubscribe() {
            Ok(()) => true,
            Err(e) => {
                warn!("trace session not cleanly stopped: {}", e);
                false
            }
        }
    }
}

impl Default for TraceSession {
    fn default() -> Self {
        Self::new()
    }
}
