//! Hostcompat Telemetry - Logging setup for hostcompat.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - Rolling file output through `tracing-appender`
//! - With the `config` feature, conversion from the `[logging]` config section
//!
//! # Example
//!
//! ```rust,no_run
//! use hostcompat_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), hostcompat_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("hostcompat_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
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

#[cfg(feature = "config")]
mod config;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
