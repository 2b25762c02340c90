//! Feature availability: product-level features mapped to host requirements.

use std::collections::BTreeMap;
use std::sync::Arc;

use hostcompat_capabilities::CapabilityRegistry;
use hostcompat_core::{
    Capability, CompatError, CompatResult, DEFAULT_SDK_VERSION, SemVer, VersionSource,
    parse_version,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a feature needs from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRequirement {
    /// Feature name (kebab-case).
    pub name: String,
    /// Lowest host SDK version that supports the feature natively.
    pub min_version: SemVer,
    /// Capability the feature is built on, if any.
    pub capability: Option<Capability>,
    /// Whether a workable non-native fallback exists.
    pub fallback: bool,
}

impl FeatureRequirement {
    /// Create a requirement without a backing capability or fallback.
    #[must_use]
    pub fn new(name: impl Into<String>, min_version: SemVer) -> Self {
        Self {
            name: name.into(),
            min_version,
            capability: None,
            fallback: false,
        }
    }

    /// Set the backing capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Mark the feature as having a fallback.
    #[must_use]
    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// The ordered table of known features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTable {
    entries: Vec<FeatureRequirement>,
}

impl Default for FeatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeatureTable {
    /// An empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The built-in feature set.
    #[must_use]
    pub fn builtin() -> Self {
        let v = SemVer::new;
        Self {
            entries: vec![
                FeatureRequirement::new("open-url", v(0, 0, 1))
                    .with_capability(Capability::OpenExternalUrl)
                    .with_fallback(),
                FeatureRequirement::new("share-url", v(0, 1, 0))
                    .with_capability(Capability::ShareUrl)
                    .with_fallback(),
                FeatureRequirement::new("compose-cast", v(0, 1, 0))
                    .with_capability(Capability::ShareUrl)
                    .with_fallback(),
                FeatureRequirement::new("push-notifications", v(0, 1, 0))
                    .with_capability(Capability::PushNotifications),
                FeatureRequirement::new("wallet-connect", v(0, 1, 0))
                    .with_capability(Capability::EthereumProvider)
                    .with_fallback(),
                FeatureRequirement::new("sign-typed-data", v(0, 2, 0))
                    .with_capability(Capability::TypedDataSigning),
                FeatureRequirement::new("send-transaction", v(0, 2, 0))
                    .with_capability(Capability::TransactionSending),
                FeatureRequirement::new("clipboard", v(0, 1, 0))
                    .with_capability(Capability::Clipboard)
                    .with_fallback(),
                FeatureRequirement::new("qr-scan", v(0, 3, 0)).with_capability(Capability::QrCode),
                FeatureRequirement::new("haptics", v(0, 2, 0))
                    .with_capability(Capability::Haptics)
                    .with_fallback(),
                FeatureRequirement::new("biometrics", v(0, 4, 0))
                    .with_capability(Capability::Biometrics),
            ],
        }
    }

    /// Look up a feature.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureRequirement> {
        self.entries.iter().find(|req| req.name == name)
    }

    fn get_mut(&mut self, name: &str) -> CompatResult<&mut FeatureRequirement> {
        self.entries
            .iter_mut()
            .find(|req| req.name == name)
            .ok_or_else(|| CompatError::UnknownIdentifier {
                kind: "feature",
                name: name.to_string(),
            })
    }

    /// Add a feature, replacing any existing one with the same name in place.
    pub fn insert(&mut self, requirement: FeatureRequirement) {
        if let Some(existing) = self.entries.iter_mut().find(|r| r.name == requirement.name) {
            *existing = requirement;
        } else {
            self.entries.push(requirement);
        }
    }

    /// Override a feature's minimum version.
    ///
    /// # Errors
    ///
    /// Returns [`CompatError::UnknownIdentifier`] if the feature is not in the table.
    pub fn set_min_version(&mut self, name: &str, min_version: SemVer) -> CompatResult<()> {
        self.get_mut(name)?.min_version = min_version;
        Ok(())
    }

    /// Override whether a feature has a fallback.
    ///
    /// # Errors
    ///
    /// Returns [`CompatError::UnknownIdentifier`] if the feature is not in the table.
    pub fn set_fallback(&mut self, name: &str, fallback: bool) -> CompatResult<()> {
        self.get_mut(name)?.fallback = fallback;
        Ok(())
    }

    /// Features in table order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureRequirement> {
        self.entries.iter()
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a feature can be used right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAvailability {
    /// Usable natively.
    pub available: bool,
    /// Minimum host SDK version, for known features.
    pub min_version: Option<String>,
    /// A non-native fallback exists.
    pub fallback_available: bool,
    /// Human-readable justification.
    pub message: String,
}

impl FeatureAvailability {
    fn unknown(name: &str) -> Self {
        let err = CompatError::UnknownIdentifier {
            kind: "feature",
            name: name.to_string(),
        };
        Self {
            available: false,
            min_version: None,
            fallback_available: false,
            message: err.to_string(),
        }
    }

    fn evaluate(requirement: &FeatureRequirement, current: &SemVer) -> Self {
        let available = current.meets(&requirement.min_version);
        let message = if available {
            format!(
                "{} is available (requires {}, host has {current})",
                requirement.name, requirement.min_version
            )
        } else if requirement.fallback {
            format!(
                "{} requires host SDK {} or later (host has {current}); a fallback is available",
                requirement.name, requirement.min_version
            )
        } else {
            format!(
                "{} requires host SDK {} or later (host has {current}); no fallback is available",
                requirement.name, requirement.min_version
            )
        };
        Self {
            available,
            min_version: Some(requirement.min_version.to_string()),
            fallback_available: requirement.fallback,
            message,
        }
    }
}

/// Snapshot of every known feature against the current host.
///
/// Computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    /// Resolved host SDK version.
    pub sdk_version: String,
    /// Where the version came from.
    pub version_source: VersionSource,
    /// Per-feature availability.
    pub features: BTreeMap<String, FeatureAvailability>,
    /// Suggested follow-ups, at most one per concern.
    pub recommendations: Vec<String>,
}

/// Answers "can I use feature X with this host at this version?".
#[derive(Debug, Clone)]
pub struct FeatureAvailabilityService {
    registry: CapabilityRegistry,
    table: Arc<FeatureTable>,
    baseline: SemVer,
}

impl FeatureAvailabilityService {
    /// Create a service over the built-in feature table.
    #[must_use]
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            table: Arc::new(FeatureTable::builtin()),
            baseline: parse_version(DEFAULT_SDK_VERSION),
        }
    }

    /// Use `table` instead of the built-in features.
    #[must_use]
    pub fn with_table(mut self, table: FeatureTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Version below which the report recommends updating the host.
    #[must_use]
    pub fn with_baseline(mut self, baseline: SemVer) -> Self {
        self.baseline = baseline;
        self
    }

    /// The feature table in use.
    #[must_use]
    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    /// The capability registry backing capability-aware checks.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Version-based availability of `name`.
    ///
    /// Unknown names are reported unavailable with no fallback.
    pub async fn check_feature_availability(&self, name: &str) -> FeatureAvailability {
        let Some(requirement) = self.table.get(name) else {
            debug!(feature = name, "availability check for unknown feature");
            return FeatureAvailability::unknown(name);
        };

        let resolution = self.registry.version().await;
        let availability = FeatureAvailability::evaluate(requirement, &resolution.version);
        debug!(
            feature = name,
            available = availability.available,
            current = %resolution.version,
            required = %requirement.min_version,
            "feature availability"
        );
        availability
    }

    /// Like [`check_feature_availability`](Self::check_feature_availability),
    /// but also requires the feature's backing capability to be supported.
    pub async fn check_feature_support(&self, name: &str) -> FeatureAvailability {
        let mut availability = self.check_feature_availability(name).await;
        if !availability.available {
            return availability;
        }

        let Some(capability) = self.table.get(name).and_then(|req| req.capability) else {
            return availability;
        };

        if !self.registry.has_capability(capability).await {
            availability.available = false;
            availability.message = format!(
                "{name} meets the version requirement but the host does not support {capability}"
            );
        }
        availability
    }

    /// `true` if `name` is available by version.
    pub async fn is_feature_available(&self, name: &str) -> bool {
        self.check_feature_availability(name).await.available
    }

    /// Evaluate every known feature and derive recommendations.
    pub async fn compatibility_report(&self) -> CompatibilityReport {
        let resolution = self.registry.version().await;
        let current = resolution.version;

        let mut features = BTreeMap::new();
        let mut blocked = Vec::new();
        for requirement in self.table.iter() {
            let availability = FeatureAvailability::evaluate(requirement, &current);
            if !availability.available && !availability.fallback_available {
                blocked.push(requirement.name.as_str());
            }
            features.insert(requirement.name.clone(), availability);
        }

        let mut recommendations = Vec::new();
        if !current.meets(&self.baseline) {
            recommendations.push(format!(
                "Host SDK {current} is below the recommended baseline {}; ask users to update their client",
                self.baseline
            ));
        }
        if !blocked.is_empty() {
            recommendations.push(format!(
                "Unavailable with no fallback on this host: {}",
                blocked.join(", ")
            ));
        }

        debug!(
            sdk_version = %current,
            features = features.len(),
            recommendations = recommendations.len(),
            "compatibility report computed"
        );

        CompatibilityReport {
            sdk_version: current.to_string(),
            version_source: resolution.source,
            features,
            recommendations,
        }
    }
}
