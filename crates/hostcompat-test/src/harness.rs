//! Test harness helpers.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Create a temporary directory for testing.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a file within a temporary directory, creating parent directories.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_file_in_dir(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// Set up test logging with the given filter.
///
/// Safe to call from many tests; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// A throwaway home directory and project root for config layering tests.
#[derive(Debug)]
pub struct ConfigSandbox {
    home: TempDir,
    root: TempDir,
}

impl ConfigSandbox {
    /// Create empty home and project directories.
    #[must_use]
    pub fn new() -> Self {
        Self {
            home: test_dir(),
            root: test_dir(),
        }
    }

    /// The fake home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// The fake project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write `~/.hostcompat/config.toml`.
    #[must_use]
    pub fn write_user_config(&self, content: &str) -> PathBuf {
        test_file_in_dir(&self.home, ".hostcompat/config.toml", content)
    }

    /// Write `{root}/.hostcompat/config.toml`.
    #[must_use]
    pub fn write_project_config(&self, content: &str) -> PathBuf {
        test_file_in_dir(&self.root, ".hostcompat/config.toml", content)
    }
}

impl Default for ConfigSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_in_dir_helper() {
        let dir = test_dir();
        let path = test_file_in_dir(&dir, "nested/file.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[test]
    fn test_sandbox_layout() {
        let sandbox = ConfigSandbox::new();
        let user = sandbox.write_user_config("[sdk]\n");
        let project = sandbox.write_project_config("[bridge]\n");
        assert!(user.starts_with(sandbox.home()));
        assert!(project.starts_with(sandbox.root()));
        assert!(user.ends_with(".hostcompat/config.toml"));
    }
}
