//! Capability detection against a host surface.

use std::sync::Arc;

use hostcompat_core::{
    Capability, ClientInfo, CompatError, HostSurface, SemVer, UNKNOWN, VersionResolution,
    current_version,
};
use hostcompat_events::{EventBus, EventKind, Subscription};
use tracing::{debug, trace, warn};

use crate::cache::CapabilityCache;

/// Answers capability questions about one host.
///
/// Every answer fails closed: an absent or failing probe means
/// "unsupported", never an error.
#[derive(Clone)]
pub struct CapabilityRegistry {
    host: Arc<dyn HostSurface>,
    default_version: SemVer,
    cache: Option<Arc<CapabilityCache>>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("default_version", &self.default_version)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CapabilityRegistry {
    /// Create an uncached registry.
    ///
    /// `default_version` is assumed when the host reports no version at all.
    #[must_use]
    pub fn new(host: Arc<dyn HostSurface>, default_version: SemVer) -> Self {
        Self {
            host,
            default_version,
            cache: None,
        }
    }

    /// Enable answer caching.
    #[must_use]
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Arc::new(CapabilityCache::new()));
        self
    }

    /// The answer cache, when enabled.
    #[must_use]
    pub fn cache(&self) -> Option<&CapabilityCache> {
        self.cache.as_deref()
    }

    /// Drop cached answers. No-op without a cache.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate();
        }
    }

    /// Invalidate the cache on every `context:update` emitted on `bus`.
    ///
    /// Returns `None` when caching is disabled. The listener only holds a
    /// weak reference to the cache.
    pub fn bind_invalidation(&self, bus: &EventBus) -> Option<Subscription> {
        let cache = Arc::downgrade(self.cache.as_ref()?);
        Some(bus.on(EventKind::ContextUpdate, move |_| {
            if let Some(cache) = cache.upgrade() {
                cache.invalidate();
            }
        }))
    }

    /// Is this execution embedded in a host?
    ///
    /// An absent or failing check counts as "not embedded".
    pub async fn is_embedded(&self) -> bool {
        match self.host.is_embedded().await {
            Ok(embedded) => embedded,
            Err(e) if e.is_absent() => {
                debug!("host has no embedding check; assuming standalone");
                false
            },
            Err(e) => {
                warn!(error = %e, "embedding check failed; assuming standalone");
                false
            },
        }
    }

    /// Resolve the host's SDK version.
    pub async fn version(&self) -> VersionResolution {
        current_version(self.host.as_ref(), self.default_version).await
    }

    /// Does the host support `capability`?
    pub async fn has_capability(&self, capability: Capability) -> bool {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(capability)) {
            trace!(%capability, supported = hit, "capability cache hit");
            return hit;
        }

        let generation = self.cache().map(CapabilityCache::generation);
        let supported = self.probe(capability).await;
        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            cache.insert(capability, supported, generation);
        }
        supported
    }

    async fn probe(&self, capability: Capability) -> bool {
        if !self.is_embedded().await {
            debug!(%capability, "not embedded; capability unsupported");
            return false;
        }

        let reported = match self.host.query_capability(capability).await {
            Ok(supported) => {
                debug!(%capability, supported, "native capability query");
                supported
            },
            Err(e) if e.is_absent() => match capability.heuristic_action() {
                Some(action) => {
                    let present = self.host.has_action(action);
                    debug!(%capability, ?action, present, "heuristic capability probe");
                    present
                },
                None => {
                    debug!(%capability, "no native query and no heuristic; unsupported");
                    false
                },
            },
            Err(e) => {
                let err = CompatError::ProbeFailure {
                    subject: capability.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "capability probe failed; treating as unsupported");
                return false;
            },
        };

        if !reported {
            return false;
        }

        if let Some(floor) = capability.min_version() {
            let resolution = self.version().await;
            if !resolution.version.meets(&floor) {
                debug!(
                    %capability,
                    current = %resolution.version,
                    required = %floor,
                    "host version below capability floor"
                );
                return false;
            }
        }

        true
    }

    /// String entry point for [`has_capability`](Self::has_capability).
    ///
    /// Unrecognized names resolve to `false`.
    pub async fn has_capability_named(&self, name: &str) -> bool {
        match name.parse::<Capability>() {
            Ok(capability) => self.has_capability(capability).await,
            Err(e) => {
                debug!(error = %e, "capability lookup by name");
                false
            },
        }
    }

    /// Check several capabilities independently, in the given order.
    pub async fn check_capabilities(&self, capabilities: &[Capability]) -> Vec<(Capability, bool)> {
        let mut results = Vec::with_capacity(capabilities.len());
        for &capability in capabilities {
            results.push((capability, self.has_capability(capability).await));
        }
        results
    }

    /// Every supported capability, in registry order.
    pub async fn supported_capabilities(&self) -> Vec<Capability> {
        let mut supported = Vec::new();
        for capability in Capability::ALL {
            if self.has_capability(capability).await {
                supported.push(capability);
            }
        }
        supported
    }

    /// Best-effort description of the host client.
    pub async fn client_info(&self) -> ClientInfo {
        match self.host.context().await {
            Ok(context) => context
                .client
                .as_ref()
                .map(ClientInfo::from)
                .unwrap_or_default(),
            Err(e) if e.is_absent() => ClientInfo::unknown(),
            Err(e) => {
                warn!(error = %e, "context read failed; client unknown");
                ClientInfo::unknown()
            },
        }
    }

    /// Is the host client named `name` (case-insensitive)?
    pub async fn is_client(&self, name: &str) -> bool {
        let info = self.client_info().await;
        info.name != UNKNOWN && info.name.eq_ignore_ascii_case(name)
    }
}
