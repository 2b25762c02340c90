//! Hostcompat Config - Layered configuration for hostcompat.
//!
//! Configuration is assembled from, in increasing precedence:
//! 1. Compiled-in defaults
//! 2. `~/.hostcompat/config.toml` (user)
//! 3. `{workspace}/.hostcompat/config.toml` (workspace)
//!
//! `HOSTCOMPAT_*` environment variables fill in fields that no file set.
//!
//! # Example
//!
//! ```rust,no_run
//! use hostcompat_config::Config;
//!
//! # fn main() -> Result<(), hostcompat_config::ConfigError> {
//! let resolved = Config::load(Some(std::path::Path::new(".")))?;
//! println!("bridge mode: {}", resolved.config.bridge.mode);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod env;
mod error;
mod loader;
mod merge;
mod show;
mod types;
mod validate;

use std::path::Path;
use std::time::Duration;

use hostcompat_core::SemVer;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_DIR, CONFIG_FILE, config_path, load_with_env};
pub use merge::{ConfigLayer, FieldSources};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::{
    BridgeSection, CapabilitiesSection, Config, FeatureOverride, LoggingSection, SdkSection,
};
pub use validate::validate;

impl Config {
    /// Load configuration for `workspace_root` with the full layer stack.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or validation fails.
    pub fn load(workspace_root: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Like [`load`](Self::load), with an explicit home directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or validation fails.
    pub fn load_with_home(
        workspace_root: Option<&Path>,
        home: &Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home))
    }

    /// Load a single file with no layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// `sdk.default_version` as a version.
    #[must_use]
    pub fn default_version(&self) -> SemVer {
        SemVer::parse(&self.sdk.default_version)
    }

    /// `sdk.baseline_version` as a version.
    #[must_use]
    pub fn baseline_version(&self) -> SemVer {
        SemVer::parse(&self.sdk.baseline_version)
    }

    /// `bridge.poll_interval_ms` as a duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.bridge.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut config = Config::default();
        config.sdk.default_version = "v0.2.1".to_owned();
        config.bridge.poll_interval_ms = 250;

        assert_eq!(config.default_version(), SemVer::new(0, 2, 1));
        assert_eq!(config.baseline_version(), SemVer::new(0, 1, 0));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_with_home() {
        let sandbox = hostcompat_test::ConfigSandbox::new();
        let _ = sandbox.write_user_config("[sdk]\nbaseline_version = \"0.2.0\"\n");

        let resolved = Config::load_with_home(None, sandbox.home()).unwrap();
        assert_eq!(resolved.config.baseline_version(), SemVer::new(0, 2, 0));
        assert_eq!(
            resolved.source_of("sdk.baseline_version"),
            Some(ConfigLayer::User)
        );
    }
}
