//! Environment variable fallbacks.
//!
//! Env vars are a fallback, not an override: they only apply to fields that
//! no config file set. Compiled-in defaults do not count as set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `HOSTCOMPAT_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "HOSTCOMPAT_SDK_DEFAULT_VERSION",
        field_path: "sdk.default_version",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_SDK_BASELINE_VERSION",
        field_path: "sdk.baseline_version",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_BRIDGE_MODE",
        field_path: "bridge.mode",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_POLL_INTERVAL_MS",
        field_path: "bridge.poll_interval_ms",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_CAPABILITY_CACHE",
        field_path: "capabilities.cache",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "HOSTCOMPAT_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that no config file set.
///
/// Returns the number of env vars applied.
pub(crate) fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| layer.is_file())
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);

    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), toml_val);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        let child = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if !child.is_table() {
            *child = toml::Value::Table(toml::map::Map::new());
        }
        current = child;
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), toml_val);
    }
}

/// Coerce a string env var value to the TOML type of the field.
///
/// Values that fail to parse stay strings so that deserialization reports
/// the mismatch against the field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "bridge.poll_interval_ms"
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if path == "capabilities.cache"
        && let Ok(b) = val.parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
