//! Auto-instrumentation of designated methods
//!
//! Wrapping replaces a registered callable with a shim that starts a trace
//! session, runs the original, and stops the session on every exit path.
//! The stop lives in a drop guard, so a panic unwinding out of the original
//! still tears the session down before it continues propagating.
//!
//! Targets resolve against the instance scope first and fall back to the
//! static scope, mirroring engines where some methods only exist at the
//! type level. A target found in neither scope is logged and skipped;
//! remaining targets are still wrapped.

use crate::session::{EventSource, TraceSession};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A (owner, method) pair designating a method to wrap
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentationTarget {
    pub owner: String,
    pub method: String,
}

impl InstrumentationTarget {
    pub fn new(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for InstrumentationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.method)
    }
}

/// Resolution scope for a registered method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Instance,
    Static,
}

/// A registered method body; the boxed original is the opaque reference
/// kept alive for the lifetime of the registry once wrapped
pub type Callable = Box<dyn FnMut() -> Result<()> + Send>;

/// Explicit stand-in for the engine's method tables
///
/// Hosts register their callables here and invoke through the registry;
/// wrapping swaps a registered entry for its instrumented shim instead of
/// rewriting bound methods behind the host's back.
#[derive(Default)]
pub struct MethodRegistry {
    instance: HashMap<(String, String), Callable>,
    statics: HashMap<(String, String), Callable>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        scope: Scope,
        owner: impl Into<String>,
        method: impl Into<String>,
        callable: Callable,
    ) {
        let key = (owner.into(), method.into());
        match scope {
            Scope::Instance => self.instance.insert(key, callable),
            Scope::Static => self.statics.insert(key, callable),
        };
    }

    /// Invoke a method, trying the instance scope first
    pub fn invoke(&mut self, owner: &str, method: &str) -> Result<()> {
        let key = (owner.to_string(), method.to_string());
        if let Some(callable) = self.instance.get_mut(&key) {
            return callable();
        }
        if let Some(callable) = self.statics.get_mut(&key) {
            return callable();
        }
        anyhow::bail!("no registered method {}.{}", owner, method);
    }

    fn take(&mut self, target: &InstrumentationTarget) -> Option<(Scope, Callable)> {
        let key = (target.owner.clone(), target.method.clone());
        if let Some(callable) = self.instance.remove(&key) {
            return Some((Scope::Instance, callable));
        }
        if let Some(callable) = self.statics.remove(&key) {
            return Some((Scope::Static, callable));
        }
        None
    }
}

/// Stops a session on drop, covering unwind as well as normal return
pub struct SessionGuard<'a> {
    session: &'a mut TraceSession,
    source: &'a dyn EventSource,
}

impl<'a> SessionGuard<'a> {
    /// Start the session and arm the guard
    pub fn start(session: &'a mut TraceSession, source: &'a dyn EventSource) -> Self {
        session.start(source);
        Self { session, source }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.stop(self.source);
    }
}

/// Decorator for plain closures: returns a callable that runs `f` inside
/// a fresh default session against `source`
pub fn traced<A, R, F>(
    source: Arc<dyn EventSource + Send + Sync>,
    mut f: F,
) -> impl FnMut(A) -> R
where
    F: FnMut(A) -> R,
{
    move |arg| {
        let mut session = TraceSession::new();
        let _guard = SessionGuard::start(&mut session, source.as_ref());
        f(arg)
    }
}

/// Wraps configured targets so their execution is bracketed by a session
pub struct Instrumentor {
    source: Arc<dyn EventSource + Send + Sync>,
    targets: Vec<InstrumentationTarget>,
    autorun: bool,
    session_factory: Arc<dyn Fn() -> TraceSession + Send + Sync>,
    autorun_session: Option<TraceSession>,
}

impl Instrumentor {
    pub fn new(
        source: Arc<dyn EventSource + Send + Sync>,
        targets: Vec<InstrumentationTarget>,
    ) -> Self {
        Self {
            source,
            targets,
            autorun: false,
            session_factory: Arc::new(TraceSession::new),
            autorun_session: None,
        }
    }

    /// Build from a loaded config: its target table and auto-run flag
    pub fn from_config(
        config: &crate::config::TraceConfig,
        source: Arc<dyn EventSource + Send + Sync>,
    ) -> Self {
        Self::new(source, config.targets.clone()).with_autorun(config.autorun)
    }

    /// Start a default session unconditionally at install time
    pub fn with_autorun(mut self, autorun: bool) -> Self {
        self.autorun = autorun;
        self
    }

    /// Override how shim sessions are built (custom filter/formatter/sink)
    pub fn with_session_factory(
        mut self,
        factory: impl Fn() -> TraceSession + Send + Sync + 'static,
    ) -> Self {
        self.session_factory = Arc::new(factory);
        self
    }

    /// Wrap every configured target in the registry
    ///
    /// Runs once at process start. Returns the number of targets wrapped;
    /// misses are logged and skipped without aborting the rest.
    pub fn install(&mut self, registry: &mut MethodRegistry) -> usize {
        if self.autorun {
            let mut session = (self.session_factory)();
            if session.start(self.source.as_ref()) {
                self.autorun_session = Some(session);
            }
        }

        let mut wrapped = 0;
        for target in self.targets.clone() {
            if self.wrap_target(registry, &target) {
                wrapped += 1;
            }
        }
        wrapped
    }

    fn wrap_target(&self, registry: &mut MethodRegistry, target: &InstrumentationTarget) -> bool {
        let Some((scope, mut original)) = registry.take(target) else {
            warn!("instrumentation target not found in any scope: {}", target);
            return false;
        };
        if scope == Scope::Static {
            debug!("instrumenting {} at static scope", target);
        }

        let source = Arc::clone(&self.source);
        let factory = Arc::clone(&self.session_factory);
        let shim: Callable = Box::new(move || {
            let mut session = factory();
            let _guard = SessionGuard::start(&mut session, source.as_ref());
            original()
        });

        registry.register(scope, target.owner.clone(), target.method.clone(), shim);
        true
    }

    /// Stop the auto-run session, if one was started
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.autorun_session.take() {
            session.stop(self.source.as_ref());
        }
    }
}
