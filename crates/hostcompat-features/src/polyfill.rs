//! Registered alternative implementations of features.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use hostcompat_core::{CompatError, panic_message};
use serde_json::Value;
use tracing::{debug, warn};

type PolyfillFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

static GLOBAL_POLYFILLS: OnceLock<PolyfillRegistry> = OnceLock::new();

/// Feature name to polyfill executor table.
///
/// Entries can be added or overwritten but never removed. Clones share the
/// same table.
#[derive(Clone, Default)]
pub struct PolyfillRegistry {
    entries: Arc<RwLock<HashMap<String, PolyfillFn>>>,
}

impl fmt::Debug for PolyfillRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyfillRegistry")
            .field("features", &self.features())
            .finish()
    }
}

impl PolyfillRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Self {
        GLOBAL_POLYFILLS.get_or_init(Self::new)
    }

    /// Register `executor` for `feature`. The last registration wins.
    ///
    /// Returns `true` if an earlier polyfill was replaced.
    pub fn register_polyfill<F, Fut, E>(&self, feature: impl Into<String>, executor: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let feature = feature.into();
        let wrapped: PolyfillFn = Arc::new(move || {
            let fut = executor();
            async move { fut.await.map_err(|e| e.to_string()) }.boxed()
        });

        let replaced = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feature.clone(), wrapped)
            .is_some();
        debug!(feature, replaced, "polyfill registered");
        replaced
    }

    /// Returns `true` if `feature` has a polyfill.
    #[must_use]
    pub fn has_polyfill(&self, feature: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(feature)
    }

    /// Names of every feature with a polyfill, sorted.
    #[must_use]
    pub fn features(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Run the polyfill for `feature`.
    ///
    /// Returns `None` when nothing is registered, or when the executor fails
    /// or panics (logged).
    pub async fn try_polyfill(&self, feature: &str) -> Option<Value> {
        match self.execute(feature).await? {
            Ok(value) => Some(value),
            Err(reason) => {
                let err = CompatError::ActionFailure {
                    feature: feature.to_string(),
                    strategy: "polyfill".to_string(),
                    reason,
                };
                warn!(error = %err, "polyfill failed");
                None
            },
        }
    }

    /// Run the polyfill for `feature`, converting panics into errors.
    ///
    /// `None` means no polyfill is registered.
    pub(crate) async fn execute(&self, feature: &str) -> Option<Result<Value, String>> {
        let executor = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(feature)
            .cloned()?;

        let fut = match catch_unwind(AssertUnwindSafe(|| executor())) {
            Ok(fut) => fut,
            Err(payload) => return Some(Err(panic_message(payload.as_ref()))),
        };

        Some(match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(panic_message(payload.as_ref())),
        })
    }
}
