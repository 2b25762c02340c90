//! Post-merge validation of the resolved [`Config`].

use hostcompat_core::SemVer;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{BridgeSection, Config};

/// Smallest accepted polling interval.
const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_sdk(config)?;
    validate_bridge(config)?;
    validate_features(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Versions in configuration are parsed strictly: a typo is an error, not
/// a silent `0.0.0`.
fn validate_version(field: &str, value: &str) -> ConfigResult<()> {
    SemVer::parse_strict(value)
        .map(|_| ())
        .map_err(|e| ConfigError::ValidationError {
            field: field.to_owned(),
            message: e.to_string(),
        })
}

fn validate_sdk(config: &Config) -> ConfigResult<()> {
    validate_version("sdk.default_version", &config.sdk.default_version)?;
    validate_version("sdk.baseline_version", &config.sdk.baseline_version)
}

fn validate_bridge(config: &Config) -> ConfigResult<()> {
    let bridge = &config.bridge;
    if !BridgeSection::MODES.contains(&bridge.mode.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "bridge.mode".to_owned(),
            message: format!(
                "unsupported bridge mode '{}'; expected one of: {}",
                bridge.mode,
                BridgeSection::MODES.join(", ")
            ),
        });
    }

    if bridge.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        return Err(ConfigError::ValidationError {
            field: "bridge.poll_interval_ms".to_owned(),
            message: format!(
                "poll interval of {}ms is below the {MIN_POLL_INTERVAL_MS}ms minimum",
                bridge.poll_interval_ms
            ),
        });
    }

    Ok(())
}

fn validate_features(config: &Config) -> ConfigResult<()> {
    for (name, entry) in &config.features {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "features".to_owned(),
                message: "feature names must not be empty".to_owned(),
            });
        }
        if let Some(min_version) = &entry.min_version {
            validate_version(&format!("features.{name}.min_version"), min_version)?;
        }
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
