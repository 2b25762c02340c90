//! Ordered fallback execution with uniform failure isolation.
//!
//! Every strategy in a [`FallbackChain`] is tried in order. A strategy that
//! returns an error or panics is logged and skipped; the chain itself never
//! fails. [`SafeInvoker::with_fallback`] builds the standard chain for a
//! feature: native action, registered polyfill, caller fallback.

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::FutureExt;
use futures::future::BoxFuture;
use hostcompat_core::{CompatError, panic_message};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::availability::FeatureAvailabilityService;
use crate::polyfill::PolyfillRegistry;

type ActionFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, String>> + Send>;

/// One deferred attempt at producing a `T`.
pub struct Action<T> {
    run: ActionFn<T>,
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Action<T> {
    /// Wrap an async closure. Its error only needs to be displayable.
    pub fn new<F, Fut, E>(action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        Self {
            run: Box::new(move || {
                let fut = action();
                async move { fut.await.map_err(|e| e.to_string()) }.boxed()
            }),
        }
    }

    /// Run the action, turning panics into errors.
    async fn attempt(self) -> Result<T, String> {
        let run = self.run;
        let fut = match catch_unwind(AssertUnwindSafe(run)) {
            Ok(fut) => fut,
            Err(payload) => return Err(panic_message(payload.as_ref())),
        };
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

/// Which kind of strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// The host's native implementation.
    Native,
    /// A registered polyfill.
    Polyfill,
    /// A caller-supplied fallback.
    Fallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Polyfill => f.write_str("polyfill"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Outcome of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invoked<T> {
    /// The native action succeeded.
    Native(T),
    /// A polyfill succeeded.
    Polyfill(T),
    /// The caller's fallback succeeded.
    Fallback(T),
    /// Every strategy failed or was skipped.
    Unavailable,
}

impl<T> Invoked<T> {
    fn from_strategy(strategy: Strategy, value: T) -> Self {
        match strategy {
            Strategy::Native => Self::Native(value),
            Strategy::Polyfill => Self::Polyfill(value),
            Strategy::Fallback => Self::Fallback(value),
        }
    }

    /// The strategy that produced the value, if any.
    #[must_use]
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Native(_) => Some(Strategy::Native),
            Self::Polyfill(_) => Some(Strategy::Polyfill),
            Self::Fallback(_) => Some(Strategy::Fallback),
            Self::Unavailable => None,
        }
    }

    /// Borrow the value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Native(v) | Self::Polyfill(v) | Self::Fallback(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Take the value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Native(v) | Self::Polyfill(v) | Self::Fallback(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Returns `true` if no strategy succeeded.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// An ordered list of strategies for one feature.
pub struct FallbackChain<T> {
    feature: String,
    steps: Vec<(Strategy, Action<T>)>,
}

impl<T> fmt::Debug for FallbackChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<Strategy> = self.steps.iter().map(|(s, _)| *s).collect();
        f.debug_struct("FallbackChain")
            .field("feature", &self.feature)
            .field("steps", &steps)
            .finish()
    }
}

impl<T: Send + 'static> FallbackChain<T> {
    /// Start an empty chain for `feature`.
    #[must_use]
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            steps: Vec::new(),
        }
    }

    /// Append a strategy.
    #[must_use]
    pub fn then(mut self, strategy: Strategy, action: Action<T>) -> Self {
        self.push(strategy, action);
        self
    }

    /// Append a strategy in place.
    pub fn push(&mut self, strategy: Strategy, action: Action<T>) {
        self.steps.push((strategy, action));
    }

    /// Insert a strategy at `index`, shifting later strategies back.
    ///
    /// Indexes past the end append.
    pub fn insert(&mut self, index: usize, strategy: Strategy, action: Action<T>) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, (strategy, action));
    }

    /// Number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the chain has no strategies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Try each strategy in order and return the first success.
    pub async fn run(self) -> Invoked<T> {
        let feature = self.feature;
        for (strategy, action) in self.steps {
            match action.attempt().await {
                Ok(value) => {
                    debug!(feature, %strategy, "strategy succeeded");
                    return Invoked::from_strategy(strategy, value);
                },
                Err(reason) => {
                    let err = CompatError::ActionFailure {
                        feature: feature.clone(),
                        strategy: strategy.to_string(),
                        reason,
                    };
                    warn!(error = %err, "strategy failed; trying next");
                },
            }
        }
        debug!(feature, "no strategy produced a result");
        Invoked::Unavailable
    }
}

/// Runs feature actions through the native, polyfill, fallback chain.
#[derive(Debug, Clone)]
pub struct SafeInvoker {
    features: FeatureAvailabilityService,
    polyfills: PolyfillRegistry,
}

impl SafeInvoker {
    /// Create an invoker backed by `features` and `polyfills`.
    #[must_use]
    pub fn new(features: FeatureAvailabilityService, polyfills: PolyfillRegistry) -> Self {
        Self {
            features,
            polyfills,
        }
    }

    /// The availability service consulted before native actions.
    #[must_use]
    pub fn features(&self) -> &FeatureAvailabilityService {
        &self.features
    }

    /// The polyfill table consulted after native actions.
    #[must_use]
    pub fn polyfills(&self) -> &PolyfillRegistry {
        &self.polyfills
    }

    /// Run `feature` through the standard chain.
    ///
    /// 1. `primary`, only if the feature is available.
    /// 2. The registered polyfill, deserialized into `T`.
    /// 3. `fallback`.
    ///
    /// Failures at every step are logged and skipped. Returns
    /// [`Invoked::Unavailable`] when nothing succeeds.
    pub async fn with_fallback<T>(
        &self,
        feature: &str,
        primary: Action<T>,
        fallback: Action<T>,
    ) -> Invoked<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let mut chain = FallbackChain::new(feature);

        if self.features.is_feature_available(feature).await {
            chain.push(Strategy::Native, primary);
        } else {
            debug!(feature, "feature unavailable; skipping native action");
        }

        if self.polyfills.has_polyfill(feature) {
            let polyfills = self.polyfills.clone();
            let name = feature.to_string();
            chain.push(
                Strategy::Polyfill,
                Action::new(move || async move {
                    let value = polyfills
                        .execute(&name)
                        .await
                        .unwrap_or_else(|| Err("polyfill no longer registered".to_string()))?;
                    serde_json::from_value::<T>(value)
                        .map_err(|e| format!("polyfill returned an unexpected shape: {e}"))
                }),
            );
        }

        chain.push(Strategy::Fallback, fallback);
        chain.run().await
    }
}

/// Two-stage variant: `primary`, then the optional `fallback`.
///
/// Returns `None` if neither produced a value.
pub async fn safe_invoke<T: Send + 'static>(primary: Action<T>, fallback: Option<Action<T>>) -> Option<T> {
    let mut chain = FallbackChain::new("safe-invoke").then(Strategy::Native, primary);
    if let Some(fallback) = fallback {
        chain.push(Strategy::Fallback, fallback);
    }
    chain.run().await.into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hostcompat_capabilities::CapabilityRegistry;
    use hostcompat_core::SemVer;
    use hostcompat_test::MockHost;
    use serde_json::json;

    fn invoker(sdk_version: &str, polyfills: PolyfillRegistry) -> SafeInvoker {
        let host = MockHost::new().with_sdk_version(sdk_version);
        let registry = CapabilityRegistry::new(Arc::new(host), SemVer::new(0, 1, 0));
        SafeInvoker::new(FeatureAvailabilityService::new(registry), polyfills)
    }

    fn ok(value: &'static str) -> Action<String> {
        Action::new(move || async move { Ok::<_, String>(value.to_string()) })
    }

    fn failing(reason: &'static str) -> Action<String> {
        Action::new(move || async move { Err::<String, _>(reason) })
    }

    fn counted(counter: &Arc<AtomicUsize>, value: &'static str) -> Action<String> {
        let counter = Arc::clone(counter);
        Action::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(value.to_string())
        })
    }

    #[tokio::test]
    async fn test_native_used_when_available() {
        let invoker = invoker("0.2.0", PolyfillRegistry::new());
        let result = invoker
            .with_fallback("share-url", ok("native"), ok("fallback"))
            .await;
        assert_eq!(result, Invoked::Native("native".to_string()));
        assert_eq!(result.strategy(), Some(Strategy::Native));
    }

    #[tokio::test]
    async fn test_throwing_primary_falls_back() {
        let invoker = invoker("0.2.0", PolyfillRegistry::new());
        let result = invoker
            .with_fallback("share-url", failing("host rejected"), ok("fallback"))
            .await;
        assert_eq!(result.into_value().as_deref(), Some("fallback"));
    }

    #[tokio::test]
    async fn test_panicking_primary_falls_back() {
        let invoker = invoker("0.2.0", PolyfillRegistry::new());
        let primary = Action::new(|| async {
            if true {
                panic!("native bridge crashed");
            }
            Ok::<String, String>(String::new())
        });
        let result = invoker.with_fallback("share-url", primary, ok("fallback")).await;
        assert_eq!(result, Invoked::Fallback("fallback".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_feature_skips_primary() {
        let invoker = invoker("0.0.9", PolyfillRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let result = invoker
            .with_fallback("share-url", counted(&calls, "native"), ok("fallback"))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result, Invoked::Fallback("fallback".to_string()));
    }

    #[tokio::test]
    async fn test_polyfill_before_fallback() {
        let polyfills = PolyfillRegistry::new();
        polyfills.register_polyfill("qr-scan", || async { Ok::<_, String>(json!("polyfilled")) });
        let invoker = invoker("0.1.0", polyfills);

        let result = invoker
            .with_fallback("qr-scan", ok("native"), ok("fallback"))
            .await;
        assert_eq!(result, Invoked::Polyfill("polyfilled".to_string()));
    }

    #[tokio::test]
    async fn test_polyfill_with_wrong_shape_falls_through() {
        let polyfills = PolyfillRegistry::new();
        polyfills.register_polyfill("qr-scan", || async { Ok::<_, String>(json!({"code": 7})) });
        let invoker = invoker("0.1.0", polyfills);

        let result = invoker
            .with_fallback("qr-scan", ok("native"), ok("fallback"))
            .await;
        assert_eq!(result, Invoked::Fallback("fallback".to_string()));
    }

    #[tokio::test]
    async fn test_everything_failing_is_unavailable() {
        let invoker = invoker("0.2.0", PolyfillRegistry::new());
        let result = invoker
            .with_fallback("share-url", failing("a"), failing("b"))
            .await;
        assert!(result.is_unavailable());
        assert!(result.value().is_none());
    }

    #[tokio::test]
    async fn test_unknown_feature_goes_straight_to_fallback() {
        let invoker = invoker("9.9.9", PolyfillRegistry::new());
        let result = invoker
            .with_fallback("teleport", ok("native"), ok("fallback"))
            .await;
        assert_eq!(result, Invoked::Fallback("fallback".to_string()));
    }

    #[tokio::test]
    async fn test_safe_invoke() {
        assert_eq!(safe_invoke(ok("primary"), None).await.as_deref(), Some("primary"));
        assert_eq!(
            safe_invoke(failing("nope"), Some(ok("backup"))).await.as_deref(),
            Some("backup")
        );
        assert!(safe_invoke(failing("nope"), None).await.is_none());
    }

    #[tokio::test]
    async fn test_chain_insert_changes_order() {
        let mut chain = FallbackChain::new("clipboard").then(Strategy::Fallback, ok("late"));
        chain.insert(0, Strategy::Polyfill, ok("early"));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.run().await, Invoked::Polyfill("early".to_string()));

        let empty: FallbackChain<String> = FallbackChain::new("nothing");
        assert!(empty.is_empty());
        assert!(empty.run().await.is_unavailable());
    }
}
