//! One handle over configuration, detection, features, and events.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use hostcompat_capabilities::CapabilityRegistry;
use hostcompat_config::{Config, ResolvedConfig};
use hostcompat_core::{
    Capability, HostSurface, NoHost, NoPlatform, PlatformSignals, SemVer, VersionResolution,
};
use hostcompat_events::{BridgeMode, BridgeOptions, BridgeReport, EventBus, Subscription};
use hostcompat_features::{
    Action, CompatibilityReport, FeatureAvailability, FeatureAvailabilityService,
    FeatureRequirement, FeatureTable, Invoked, PolyfillRegistry, SafeInvoker,
};
use hostcompat_telemetry::{LogConfig, setup_logging};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::SetupResult;

/// A fully wired compatibility layer for one host.
///
/// Dropping it detaches cache invalidation. The bridge, including any context
/// poller, belongs to the bus and outlives the instance, since other
/// instances may share that bus.
pub struct Compat {
    config: Config,
    bus: EventBus,
    invoker: SafeInvoker,
    bridge: Option<BridgeReport>,
    invalidation: Option<Subscription>,
}

impl fmt::Debug for Compat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compat")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl Compat {
    /// Start configuring a new instance.
    #[must_use]
    pub fn builder() -> CompatBuilder {
        CompatBuilder::new()
    }

    /// The configuration this instance was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The event bus host and platform signals are bridged onto.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Capability detection.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        self.invoker.features().registry()
    }

    /// Feature availability.
    #[must_use]
    pub fn features(&self) -> &FeatureAvailabilityService {
        self.invoker.features()
    }

    /// Polyfills consulted by [`with_fallback`](Self::with_fallback).
    #[must_use]
    pub fn polyfills(&self) -> &PolyfillRegistry {
        self.invoker.polyfills()
    }

    /// The fallback runner.
    #[must_use]
    pub fn invoker(&self) -> &SafeInvoker {
        &self.invoker
    }

    /// What the bridge wired, or `None` if this instance did not bridge the
    /// bus (disabled, or the bus was already bridged).
    #[must_use]
    pub fn bridge(&self) -> Option<&BridgeReport> {
        self.bridge.as_ref()
    }

    /// Resolve the host SDK version.
    pub async fn version(&self) -> VersionResolution {
        self.registry().version().await
    }

    /// Does the host support `capability`?
    pub async fn has_capability(&self, capability: Capability) -> bool {
        self.registry().has_capability(capability).await
    }

    /// Version-based availability of a feature.
    pub async fn check_feature_availability(&self, feature: &str) -> FeatureAvailability {
        self.features().check_feature_availability(feature).await
    }

    /// `true` if `feature` is available by version.
    pub async fn is_feature_available(&self, feature: &str) -> bool {
        self.features().is_feature_available(feature).await
    }

    /// Evaluate every known feature.
    pub async fn compatibility_report(&self) -> CompatibilityReport {
        self.features().compatibility_report().await
    }

    /// Run `feature` through native, polyfill, then fallback.
    pub async fn with_fallback<T>(
        &self,
        feature: &str,
        primary: Action<T>,
        fallback: Action<T>,
    ) -> Invoked<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.invoker.with_fallback(feature, primary, fallback).await
    }
}

impl Drop for Compat {
    fn drop(&mut self) {
        if let Some(subscription) = self.invalidation.take() {
            let _ = subscription.unsubscribe();
        }
    }
}

/// Builder for [`Compat`].
///
/// Defaults to an absent host and platform, the default configuration, and
/// the process-wide event bus and polyfill registry.
pub struct CompatBuilder {
    host: Arc<dyn HostSurface>,
    platform: Arc<dyn PlatformSignals>,
    config: Config,
    bus: Option<EventBus>,
    polyfills: Option<PolyfillRegistry>,
    table: FeatureTable,
    bridge: bool,
}

impl fmt::Debug for CompatBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatBuilder")
            .field("config", &self.config)
            .field("table", &self.table)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl Default for CompatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompatBuilder {
    /// A builder with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: Arc::new(NoHost),
            platform: Arc::new(NoPlatform),
            config: Config::default(),
            bus: None,
            polyfills: None,
            table: FeatureTable::builtin(),
            bridge: true,
        }
    }

    /// The host to negotiate with.
    #[must_use]
    pub fn host(self, host: impl HostSurface + 'static) -> Self {
        self.host_arc(Arc::new(host))
    }

    /// The host to negotiate with, already shared.
    #[must_use]
    pub fn host_arc(mut self, host: Arc<dyn HostSurface>) -> Self {
        self.host = host;
        self
    }

    /// Platform visibility and color-scheme signals.
    #[must_use]
    pub fn platform(mut self, platform: impl PlatformSignals + 'static) -> Self {
        self.platform = Arc::new(platform);
        self
    }

    /// Use `config` as is.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use an already resolved configuration.
    #[must_use]
    pub fn resolved_config(self, resolved: ResolvedConfig) -> Self {
        self.config(resolved.config)
    }

    /// Load the layered configuration for `workspace_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is malformed or invalid.
    pub fn load_config(self, workspace_root: Option<&Path>) -> SetupResult<Self> {
        let resolved = Config::load(workspace_root)?;
        Ok(self.resolved_config(resolved))
    }

    /// Bridge onto `bus` instead of the process-wide bus.
    #[must_use]
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Consult `polyfills` instead of the process-wide registry.
    #[must_use]
    pub fn polyfills(mut self, polyfills: PolyfillRegistry) -> Self {
        self.polyfills = Some(polyfills);
        self
    }

    /// Use a fresh bus and polyfill registry owned by this instance.
    #[must_use]
    pub fn isolated(self) -> Self {
        self.bus(EventBus::new()).polyfills(PolyfillRegistry::new())
    }

    /// Start from `table` instead of the built-in features. Configured
    /// overrides still apply on top.
    #[must_use]
    pub fn feature_table(mut self, table: FeatureTable) -> Self {
        self.table = table;
        self
    }

    /// Do not bridge host and platform signals onto the bus.
    #[must_use]
    pub fn without_bridge(mut self) -> Self {
        self.bridge = false;
        self
    }

    /// Assemble the instance.
    ///
    /// Bridging spawns a context poller in the polling modes, which needs a
    /// Tokio runtime; without one polling is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn build(self) -> SetupResult<Compat> {
        let Self {
            host,
            platform,
            config,
            bus,
            polyfills,
            mut table,
            bridge,
        } = self;

        hostcompat_config::validate(&config)?;
        let mode: BridgeMode = config.bridge.mode.parse()?;
        apply_feature_overrides(&mut table, &config)?;

        let bus = bus.unwrap_or_else(|| EventBus::global().clone());
        let polyfills = polyfills.unwrap_or_else(|| PolyfillRegistry::global().clone());

        let mut registry = CapabilityRegistry::new(Arc::clone(&host), config.default_version());
        if config.capabilities.cache {
            registry = registry.with_cache();
        }
        let invalidation = registry.bind_invalidation(&bus);

        let features = FeatureAvailabilityService::new(registry)
            .with_table(table)
            .with_baseline(config.baseline_version());

        let bridge = if bridge {
            let options = BridgeOptions {
                mode,
                poll_interval: config.poll_interval(),
                visibility: config.bridge.visibility,
                color_scheme: config.bridge.color_scheme,
            };
            bus.initialize(host, platform, &options)
        } else {
            None
        };

        info!(
            ?mode,
            cache = config.capabilities.cache,
            bridged = bridge.is_some(),
            "hostcompat ready"
        );

        Ok(Compat {
            config,
            bus,
            invoker: SafeInvoker::new(features, polyfills),
            bridge,
            invalidation,
        })
    }
}

/// Apply `[features.*]` overrides onto `table`.
///
/// An override for a feature missing from the table adds it when it names a
/// minimum version, and is ignored otherwise.
fn apply_feature_overrides(table: &mut FeatureTable, config: &Config) -> SetupResult<()> {
    for (name, entry) in &config.features {
        let min_version = entry.min_version.as_deref().map(SemVer::parse);

        if table.get(name).is_none() {
            let Some(min_version) = min_version else {
                warn!(feature = %name, "override for unknown feature has no min_version; ignored");
                continue;
            };
            let mut requirement = FeatureRequirement::new(name.clone(), min_version);
            requirement.fallback = entry.fallback.unwrap_or(false);
            debug!(feature = %name, %min_version, "feature added from configuration");
            table.insert(requirement);
            continue;
        }

        if let Some(min_version) = min_version {
            table.set_min_version(name, min_version)?;
        }
        if let Some(fallback) = entry.fallback {
            table.set_fallback(name, fallback)?;
        }
        debug!(feature = %name, "feature overridden from configuration");
    }
    Ok(())
}

/// Install the global tracing subscriber from the `[logging]` section.
///
/// # Errors
///
/// Returns an error if the section is invalid or a subscriber is already
/// installed.
pub fn init_logging(config: &Config) -> SetupResult<()> {
    let log_config = LogConfig::try_from(&config.logging)?;
    setup_logging(&log_config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcompat_config::FeatureOverride;

    fn override_entry(min_version: Option<&str>, fallback: Option<bool>) -> FeatureOverride {
        FeatureOverride {
            min_version: min_version.map(str::to_owned),
            fallback,
        }
    }

    #[test]
    fn test_overrides_adjust_builtin_features() {
        let mut config = Config::default();
        config
            .features
            .insert("haptics".to_owned(), override_entry(Some("0.3.0"), Some(false)));
        config
            .features
            .insert("clipboard".to_owned(), override_entry(None, Some(false)));

        let mut table = FeatureTable::builtin();
        apply_feature_overrides(&mut table, &config).unwrap();

        let haptics = table.get("haptics").unwrap();
        assert_eq!(haptics.min_version, SemVer::new(0, 3, 0));
        assert!(!haptics.fallback);
        assert_eq!(
            table.get("clipboard").unwrap().min_version,
            SemVer::new(0, 1, 0)
        );
        assert!(!table.get("clipboard").unwrap().fallback);
    }

    #[test]
    fn test_overrides_for_unknown_features() {
        let mut config = Config::default();
        config
            .features
            .insert("mini-games".to_owned(), override_entry(Some("0.5.0"), Some(true)));
        config
            .features
            .insert("teleport".to_owned(), override_entry(None, Some(true)));

        let mut table = FeatureTable::builtin();
        let before = table.len();
        apply_feature_overrides(&mut table, &config).unwrap();

        let added = table.get("mini-games").unwrap();
        assert_eq!(added.min_version, SemVer::new(0, 5, 0));
        assert!(added.fallback);
        assert!(added.capability.is_none());
        assert!(table.get("teleport").is_none());
        assert_eq!(table.len(), before.saturating_add(1));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.bridge.mode = "carrier-pigeon".to_owned();
        let err = Compat::builder().config(config).isolated().build().unwrap_err();
        assert!(matches!(err, crate::SetupError::Config(_)));
    }

    #[test]
    fn test_build_without_runtime_skips_poller() {
        let mut config = Config::default();
        config.bridge.mode = "poll".to_owned();
        let compat = Compat::builder().config(config).isolated().build().unwrap();

        let bridge = compat.bridge().unwrap();
        assert!(!bridge.polling);
        assert!(!bridge.context_push);
    }

    #[test]
    fn test_without_bridge_leaves_bus_untouched() {
        let compat = Compat::builder().isolated().without_bridge().build().unwrap();
        assert!(compat.bridge().is_none());
        assert_eq!(
            compat.bus().bridge_state(),
            hostcompat_events::BridgeState::Uninitialized
        );
    }
}
