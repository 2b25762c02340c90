//! Configuration types for hostcompat.
//!
//! The types here only depend on `hostcompat-core` for version validation.
//! Event and feature types are mirrored as plain strings and numbers and
//! converted at the boundary. Every struct implements [`Default`] so that a
//! bare `[section]` header in TOML produces a working configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Loaded from layered TOML files (user, workspace) with environment
/// variable fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host SDK version assumptions.
    pub sdk: SdkSection,
    /// How host and platform signals reach the event bus.
    pub bridge: BridgeSection,
    /// Capability detection knobs.
    pub capabilities: CapabilitiesSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Per-feature overrides of the built-in feature table, keyed by
    /// feature name.
    pub features: BTreeMap<String, FeatureOverride>,
}

// ---------------------------------------------------------------------------
// SdkSection
// ---------------------------------------------------------------------------

/// Host SDK version assumptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkSection {
    /// Version assumed when the host reports none.
    pub default_version: String,
    /// Oldest host version the mini-app targets.
    pub baseline_version: String,
}

impl Default for SdkSection {
    fn default() -> Self {
        Self {
            default_version: "0.1.0".to_owned(),
            baseline_version: "0.1.0".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeSection
// ---------------------------------------------------------------------------

/// Event bridging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BridgeSection {
    /// `"push"`, `"poll"`, or `"push-and-poll"`.
    pub mode: String,
    /// Milliseconds between context polls in the polling modes.
    pub poll_interval_ms: u64,
    /// Forward platform visibility changes.
    pub visibility: bool,
    /// Forward platform color-scheme changes.
    pub color_scheme: bool,
}

impl BridgeSection {
    /// Accepted values for [`mode`](Self::mode).
    pub const MODES: [&'static str; 3] = ["push", "poll", "push-and-poll"];
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            mode: "push".to_owned(),
            poll_interval_ms: 5000,
            visibility: true,
            color_scheme: true,
        }
    }
}

// ---------------------------------------------------------------------------
// CapabilitiesSection
// ---------------------------------------------------------------------------

/// Capability detection knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesSection {
    /// Cache capability answers until the host context changes.
    pub cache: bool,
}

impl Default for CapabilitiesSection {
    fn default() -> Self {
        Self { cache: true }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["hostcompat_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureOverride
// ---------------------------------------------------------------------------

/// Adjustments to one feature table entry.
///
/// Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureOverride {
    /// Replacement minimum host version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    /// Replacement fallback flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[sdk]\n[bridge]\n[logging]\n").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bridge.mode, "push");
        assert!(config.capabilities.cache);
    }

    #[test]
    fn test_feature_override_partial() {
        let config: Config = toml::from_str(
            r#"
            [features.haptics]
            min_version = "0.3.0"

            [features.share-url]
            fallback = false
            "#,
        )
        .unwrap();

        let haptics = &config.features["haptics"];
        assert_eq!(haptics.min_version.as_deref(), Some("0.3.0"));
        assert_eq!(haptics.fallback, None);
        assert_eq!(config.features["share-url"].fallback, Some(false));
    }

    #[test]
    fn test_feature_override_rejects_unknown_keys() {
        let result: Result<Config, _> = toml::from_str("[features.haptics]\nminimum = \"1.0.0\"\n");
        assert!(result.is_err());
    }
}
