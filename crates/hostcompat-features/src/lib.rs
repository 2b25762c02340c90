//! Hostcompat Features - Product-level feature negotiation.
//!
//! This crate provides:
//! - [`FeatureAvailabilityService`]: "can I use feature X at this host
//!   version?", plus a full [`CompatibilityReport`]
//! - [`PolyfillRegistry`]: alternative implementations keyed by feature name
//! - [`SafeInvoker`] and [`FallbackChain`]: ordered native, polyfill, and
//!   fallback execution that never fails outward
//!
//! # Example
//!
//! ```rust,ignore
//! use hostcompat_features::{Action, Invoked, SafeInvoker};
//!
//! let outcome = invoker
//!     .with_fallback(
//!         "share-url",
//!         Action::new(|| async { host.compose_cast(url).await }),
//!         Action::new(|| async { copy_link_to_clipboard(url).await }),
//!     )
//!     .await;
//!
//! if let Invoked::Unavailable = outcome {
//!     show_manual_share_hint();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod availability;
mod invoke;
mod polyfill;

pub use availability::{
    CompatibilityReport, FeatureAvailability, FeatureAvailabilityService, FeatureRequirement,
    FeatureTable,
};
pub use invoke::{Action, FallbackChain, Invoked, SafeInvoker, Strategy, safe_invoke};
pub use polyfill::PolyfillRegistry;
