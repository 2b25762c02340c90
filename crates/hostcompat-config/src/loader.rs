//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.hostcompat/config.toml` (user)
//! 3. Merge `{workspace}/.hostcompat/config.toml` (workspace)
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize merged tree → `Config`
//! 6. Validate
//! 7. Return `ResolvedConfig`

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Directory holding config files under the home and workspace roots.
pub const CONFIG_DIR: &str = ".hostcompat";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the configuration with layered file precedence.
///
/// `workspace_root` is the root of the current project. If `None`, the
/// workspace layer is skipped. `home_override` replaces the user's home
/// directory for discovery of the user layer.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub(crate) fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(workspace_root, home_override, &collect_env_vars())
}

/// [`Config::load_with_home`] against an explicit set of environment
/// variables instead of the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load_with_env<S: BuildHasher>(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let home_dir = match home_override {
        Some(h) => h.to_path_buf(),
        None => home_directory()?,
    };

    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    // 2-3. User, then workspace.
    let mut layers = vec![(ConfigLayer::User, config_path(&home_dir))];
    if let Some(root) = workspace_root {
        layers.push((ConfigLayer::Workspace, config_path(root)));
    }

    for (layer, path) in layers {
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, "", layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), %layer, "loaded config file");
        }
    }

    // 4. Env var fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering, no env).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or
/// validated.
pub(crate) fn load_file(path: &Path) -> ConfigResult<Config> {
    let Some(value) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };

    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// `{root}/.hostcompat/config.toml`.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// A single read avoids racing a separate existence check.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcompat_test::ConfigSandbox;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let val: toml::Value = toml::from_str(DEFAULTS_TOML).unwrap();
        let config: Config = val.try_into().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_files() {
        let sandbox = ConfigSandbox::new();
        let resolved =
            load_with_env(Some(sandbox.root()), Some(sandbox.home()), &env(&[])).unwrap();

        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.source_of("bridge.mode"),
            Some(ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_workspace_overrides_user() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_user_config(
            "[bridge]\nmode = \"poll\"\npoll_interval_ms = 2000\n[logging]\nlevel = \"debug\"\n",
        );
        let _ = sandbox.write_project_config("[bridge]\nmode = \"push-and-poll\"\n");

        let resolved =
            load_with_env(Some(sandbox.root()), Some(sandbox.home()), &env(&[])).unwrap();

        assert_eq!(resolved.config.bridge.mode, "push-and-poll");
        assert_eq!(resolved.config.bridge.poll_interval_ms, 2000);
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.source_of("bridge.mode"),
            Some(ConfigLayer::Workspace)
        );
        assert_eq!(
            resolved.source_of("bridge.poll_interval_ms"),
            Some(ConfigLayer::User)
        );
    }

    #[test]
    fn test_workspace_layer_skipped_without_root() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_project_config("[bridge]\nmode = \"poll\"\n");
        let resolved = load_with_env(None, Some(sandbox.home()), &env(&[])).unwrap();
        assert_eq!(resolved.config.bridge.mode, "push");
    }

    #[test]
    fn test_env_is_fallback_only() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_user_config("[logging]\nlevel = \"warn\"\n");

        let resolved = load_with_env(
            Some(sandbox.root()),
            Some(sandbox.home()),
            &env(&[
                ("HOSTCOMPAT_LOG_LEVEL", "trace"),
                ("HOSTCOMPAT_CAPABILITY_CACHE", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(resolved.config.logging.level, "warn");
        assert!(!resolved.config.capabilities.cache);
        assert_eq!(
            resolved.source_of("capabilities.cache"),
            Some(ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_feature_overrides_loaded() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_project_config(
            "[features.haptics]\nmin_version = \"0.3.0\"\n\n[features.clipboard]\nfallback = false\n",
        );

        let resolved =
            load_with_env(Some(sandbox.root()), Some(sandbox.home()), &env(&[])).unwrap();
        let features = &resolved.config.features;
        assert_eq!(features.len(), 2);
        assert_eq!(features["haptics"].min_version.as_deref(), Some("0.3.0"));
        assert_eq!(features["clipboard"].fallback, Some(false));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_user_config("[sdk]\ndefault_version = \"latest\"\n");
        let err = load_with_env(None, Some(sandbox.home()), &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "sdk.default_version"));

        let sandbox = ConfigSandbox::new();
        let err = load_with_env(
            None,
            Some(sandbox.home()),
            &env(&[("HOSTCOMPAT_POLL_INTERVAL_MS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let sandbox = ConfigSandbox::new();
        let _ = sandbox.write_project_config("[bridge\nmode = ");
        let err = load_with_env(Some(sandbox.root()), Some(sandbox.home()), &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compat.toml");
        std::fs::write(&path, "[capabilities]\ncache = false\n").unwrap();

        let config = load_file(&path).unwrap();
        assert!(!config.capabilities.cache);
        assert_eq!(config.bridge.mode, "push");
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/hostcompat.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.toml");
        let padding = "# padding\n".repeat(110_000);
        std::fs::write(&path, padding).unwrap();

        let result = try_load_file(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
