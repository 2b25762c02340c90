//! Hostcompat - Capability negotiation and graceful degradation for mini-apps
//! embedded in host clients.
//!
//! This crate wires the workspace crates together behind one handle:
//! - [`hostcompat_config`] for layered configuration
//! - [`hostcompat_capabilities`] for fail-closed capability detection
//! - [`hostcompat_features`] for feature availability, polyfills, and fallbacks
//! - [`hostcompat_events`] for the lifecycle event bus and host bridging
//! - [`hostcompat_telemetry`] for logging setup
//!
//! # Example
//!
//! ```rust,no_run
//! use hostcompat::prelude::*;
//!
//! # async fn example(host: impl HostSurface + 'static) -> SetupResult<()> {
//! let compat = Compat::builder().host(host).load_config(None)?.build()?;
//!
//! let shared: Invoked<String> = compat
//!     .with_fallback(
//!         "share-url",
//!         Action::new(|| async { Ok::<_, String>("shared natively".to_string()) }),
//!         Action::new(|| async { Ok::<_, String>("copied link instead".to_string()) }),
//!     )
//!     .await;
//! println!("{:?} via {:?}", shared.value(), shared.strategy());
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

mod compat;
mod error;

pub use compat::{Compat, CompatBuilder, init_logging};
pub use error::{SetupError, SetupResult};
