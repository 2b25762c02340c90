//! Setup error types.

use hostcompat_config::ConfigError;
use hostcompat_core::CompatError;
use hostcompat_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling a [`Compat`](crate::Compat).
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured value does not match anything known.
    #[error(transparent)]
    Compat(#[from] CompatError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for setup operations.
pub type SetupResult<T> = Result<T, SetupError>;
