//! Scriptable host and platform mocks.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hostcompat_core::{
    Capability, ColorScheme, ColorSchemeSink, ContextSink, HostAction, HostContext, HostError,
    HostResult, HostSurface, PlatformSignals, VisibilitySink,
};

/// Counts of calls made against a [`MockHost`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockHostCalls {
    /// Calls to `is_embedded`.
    pub embedded_checks: usize,
    /// Calls to `context`.
    pub context_reads: usize,
    /// Calls to `query_capability`.
    pub capability_queries: usize,
    /// Calls to `metadata_version`.
    pub metadata_reads: usize,
}

/// Scripted answer for one host member: absent, a value, or a failure.
#[derive(Debug, Clone)]
enum Scripted<T> {
    Absent,
    Value(T),
    Fail(String),
}

impl<T: Clone> Scripted<T> {
    fn answer(&self, member: &'static str) -> HostResult<T> {
        match self {
            Self::Absent => Err(HostError::absent(member)),
            Self::Value(value) => Ok(value.clone()),
            Self::Fail(reason) => Err(HostError::probe(member, reason.clone())),
        }
    }
}

#[derive(Debug)]
struct MockHostState {
    embedded: Scripted<bool>,
    context: Scripted<HostContext>,
    /// `None` means the host has no capability query at all.
    capabilities: Option<HashMap<Capability, Result<bool, String>>>,
    actions: HashSet<HostAction>,
    sdk_version: Option<String>,
    metadata_version: Scripted<String>,
    context_push: bool,
    calls: MockHostCalls,
}

impl Default for MockHostState {
    fn default() -> Self {
        Self {
            embedded: Scripted::Value(true),
            context: Scripted::Absent,
            capabilities: None,
            actions: HashSet::new(),
            sdk_version: None,
            metadata_version: Scripted::Absent,
            context_push: false,
            calls: MockHostCalls::default(),
        }
    }
}

/// Mock implementation of [`HostSurface`].
///
/// A fresh mock is embedded and exposes nothing else. Builder methods opt
/// into individual host members; runtime setters change answers mid-test.
/// Uses `std::sync::Mutex` so builders work without a tokio runtime.
#[derive(Clone, Default)]
pub struct MockHost {
    state: Arc<Mutex<MockHostState>>,
    sinks: Arc<Mutex<Vec<ContextSink>>>,
}

impl fmt::Debug for MockHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHost")
            .field("state", &self.state)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl MockHost {
    /// Create an embedded mock host that exposes nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that reports it is not embedded.
    #[must_use]
    pub fn standalone() -> Self {
        Self::new().with_embedded(false)
    }

    fn update(&self, f: impl FnOnce(&mut MockHostState)) {
        if let Ok(mut guard) = self.state.lock() {
            f(&mut guard);
        }
    }

    fn read<T>(&self, f: impl FnOnce(&mut MockHostState) -> T) -> Option<T> {
        self.state.lock().ok().map(|mut guard| f(&mut guard))
    }

    /// Answer `is_embedded` with `embedded`.
    #[must_use]
    pub fn with_embedded(self, embedded: bool) -> Self {
        self.update(|s| s.embedded = Scripted::Value(embedded));
        self
    }

    /// Make `is_embedded` fail.
    #[must_use]
    pub fn with_embedded_error(self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.update(|s| s.embedded = Scripted::Fail(reason));
        self
    }

    /// Make `is_embedded` absent.
    #[must_use]
    pub fn without_embedding_check(self) -> Self {
        self.update(|s| s.embedded = Scripted::Absent);
        self
    }

    /// Answer `context` with `context`.
    #[must_use]
    pub fn with_context(self, context: HostContext) -> Self {
        self.set_context(context);
        self
    }

    /// Make `context` fail.
    #[must_use]
    pub fn with_context_error(self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.update(|s| s.context = Scripted::Fail(reason));
        self
    }

    /// Expose a native capability query that answers `false` for everything
    /// not configured with [`with_capability`](Self::with_capability).
    #[must_use]
    pub fn with_capability_query(self) -> Self {
        self.update(|s| {
            s.capabilities.get_or_insert_with(HashMap::new);
        });
        self
    }

    /// Expose a native capability query answering `supported` for `capability`.
    #[must_use]
    pub fn with_capability(self, capability: Capability, supported: bool) -> Self {
        self.set_capability(capability, supported);
        self
    }

    /// Make the native query fail for `capability`.
    #[must_use]
    pub fn with_capability_error(self, capability: Capability, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.update(|s| {
            s.capabilities
                .get_or_insert_with(HashMap::new)
                .insert(capability, Err(reason));
        });
        self
    }

    /// Expose `action`.
    #[must_use]
    pub fn with_action(self, action: HostAction) -> Self {
        self.update(|s| {
            s.actions.insert(action);
        });
        self
    }

    /// Expose every action in `actions`.
    #[must_use]
    pub fn with_actions(self, actions: impl IntoIterator<Item = HostAction>) -> Self {
        self.update(|s| s.actions.extend(actions));
        self
    }

    /// Report `version` through the direct SDK version field.
    #[must_use]
    pub fn with_sdk_version(self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.update(|s| s.sdk_version = Some(version));
        self
    }

    /// Report `version` through the metadata channel.
    #[must_use]
    pub fn with_metadata_version(self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.update(|s| s.metadata_version = Scripted::Value(version));
        self
    }

    /// Make the metadata version lookup fail.
    #[must_use]
    pub fn with_metadata_error(self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.update(|s| s.metadata_version = Scripted::Fail(reason));
        self
    }

    /// Support `subscribe_context`.
    #[must_use]
    pub fn with_context_push(self) -> Self {
        self.update(|s| s.context_push = true);
        self
    }

    /// Change the context returned by subsequent reads.
    pub fn set_context(&self, context: HostContext) {
        self.update(|s| s.context = Scripted::Value(context));
    }

    /// Change the native answer for `capability`.
    pub fn set_capability(&self, capability: Capability, supported: bool) {
        self.update(|s| {
            s.capabilities
                .get_or_insert_with(HashMap::new)
                .insert(capability, Ok(supported));
        });
    }

    /// Store `context` and deliver it to every context subscriber.
    ///
    /// Returns the number of subscribers notified.
    pub fn push_context(&self, context: HostContext) -> usize {
        self.set_context(context.clone());
        let sinks: Vec<ContextSink> = self
            .sinks
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default();
        for sink in &sinks {
            sink(context.clone());
        }
        sinks.len()
    }

    /// Number of registered context subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks.lock().map(|g| g.len()).unwrap_or_default()
    }

    /// Call counters so far.
    #[must_use]
    pub fn calls(&self) -> MockHostCalls {
        self.read(|s| s.calls).unwrap_or_default()
    }
}

#[async_trait]
impl HostSurface for MockHost {
    async fn is_embedded(&self) -> HostResult<bool> {
        self.read(|s| {
            s.calls.embedded_checks = s.calls.embedded_checks.saturating_add(1);
            s.embedded.answer("is_embedded")
        })
        .unwrap_or_else(|| Err(HostError::probe("is_embedded", "mock state poisoned")))
    }

    async fn context(&self) -> HostResult<HostContext> {
        self.read(|s| {
            s.calls.context_reads = s.calls.context_reads.saturating_add(1);
            s.context.answer("context")
        })
        .unwrap_or_else(|| Err(HostError::probe("context", "mock state poisoned")))
    }

    async fn query_capability(&self, capability: Capability) -> HostResult<bool> {
        self.read(|s| {
            s.calls.capability_queries = s.calls.capability_queries.saturating_add(1);
            match &s.capabilities {
                None => Err(HostError::absent("query_capability")),
                Some(answers) => match answers.get(&capability) {
                    Some(Ok(supported)) => Ok(*supported),
                    Some(Err(reason)) => Err(HostError::probe("query_capability", reason.clone())),
                    None => Ok(false),
                },
            }
        })
        .unwrap_or_else(|| Err(HostError::probe("query_capability", "mock state poisoned")))
    }

    fn has_action(&self, action: HostAction) -> bool {
        self.read(|s| s.actions.contains(&action)).unwrap_or(false)
    }

    fn sdk_version(&self) -> Option<String> {
        self.read(|s| s.sdk_version.clone()).flatten()
    }

    async fn metadata_version(&self) -> HostResult<String> {
        self.read(|s| {
            s.calls.metadata_reads = s.calls.metadata_reads.saturating_add(1);
            s.metadata_version.answer("metadata_version")
        })
        .unwrap_or_else(|| Err(HostError::probe("metadata_version", "mock state poisoned")))
    }

    fn subscribe_context(&self, sink: ContextSink) -> HostResult<()> {
        if !self.read(|s| s.context_push).unwrap_or(false) {
            return Err(HostError::absent("subscribe_context"));
        }
        if let Ok(mut guard) = self.sinks.lock() {
            guard.push(sink);
        }
        Ok(())
    }
}

/// Mock implementation of [`PlatformSignals`].
///
/// Both signals are supported unless disabled. Tests drive changes with
/// [`fire_visibility`](Self::fire_visibility) and
/// [`fire_color_scheme`](Self::fire_color_scheme).
#[derive(Clone)]
pub struct MockPlatform {
    visible: Arc<Mutex<bool>>,
    scheme: Arc<Mutex<ColorScheme>>,
    visibility_sinks: Arc<Mutex<Vec<VisibilitySink>>>,
    scheme_sinks: Arc<Mutex<Vec<ColorSchemeSink>>>,
    supports_visibility: bool,
    supports_color_scheme: bool,
}

impl fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPlatform")
            .field("visible", &self.visibility())
            .field("scheme", &self.color_scheme())
            .field("supports_visibility", &self.supports_visibility)
            .field("supports_color_scheme", &self.supports_color_scheme)
            .finish_non_exhaustive()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a visible, light-themed platform supporting both signals.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: Arc::new(Mutex::new(true)),
            scheme: Arc::new(Mutex::new(ColorScheme::Light)),
            visibility_sinks: Arc::new(Mutex::new(Vec::new())),
            scheme_sinks: Arc::new(Mutex::new(Vec::new())),
            supports_visibility: true,
            supports_color_scheme: true,
        }
    }

    /// Drop visibility support.
    #[must_use]
    pub fn without_visibility(mut self) -> Self {
        self.supports_visibility = false;
        self
    }

    /// Drop color-scheme support.
    #[must_use]
    pub fn without_color_scheme(mut self) -> Self {
        self.supports_color_scheme = false;
        self
    }

    /// Change visibility and notify listeners. Returns listeners notified.
    pub fn fire_visibility(&self, visible: bool) -> usize {
        if let Ok(mut guard) = self.visible.lock() {
            *guard = visible;
        }
        let sinks: Vec<VisibilitySink> = self
            .visibility_sinks
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default();
        for sink in &sinks {
            sink(visible);
        }
        sinks.len()
    }

    /// Change the color scheme and notify listeners. Returns listeners notified.
    pub fn fire_color_scheme(&self, scheme: ColorScheme) -> usize {
        if let Ok(mut guard) = self.scheme.lock() {
            *guard = scheme;
        }
        let sinks: Vec<ColorSchemeSink> = self
            .scheme_sinks
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default();
        for sink in &sinks {
            sink(scheme);
        }
        sinks.len()
    }
}

impl PlatformSignals for MockPlatform {
    fn visibility(&self) -> Option<bool> {
        if !self.supports_visibility {
            return None;
        }
        self.visible.lock().ok().map(|g| *g)
    }

    fn on_visibility_change(&self, sink: VisibilitySink) -> bool {
        if !self.supports_visibility {
            return false;
        }
        if let Ok(mut guard) = self.visibility_sinks.lock() {
            guard.push(sink);
        }
        true
    }

    fn color_scheme(&self) -> Option<ColorScheme> {
        if !self.supports_color_scheme {
            return None;
        }
        self.scheme.lock().ok().map(|g| *g)
    }

    fn on_color_scheme_change(&self, sink: ColorSchemeSink) -> bool {
        if !self.supports_color_scheme {
            return false;
        }
        if let Ok(mut guard) = self.scheme_sinks.lock() {
            guard.push(sink);
        }
        true
    }
}
