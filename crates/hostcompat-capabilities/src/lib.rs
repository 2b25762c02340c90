//! Hostcompat Capabilities - Fail-closed host capability detection.
//!
//! This crate provides:
//! - [`CapabilityRegistry`], answering "does this host support X?" for every
//!   [`Capability`](hostcompat_core::Capability)
//! - An optional answer cache ([`CapabilityCache`]) that is dropped whenever
//!   the host pushes a new context
//!
//! # Detection order
//!
//! 1. Not embedded in a host (or the check is absent or fails): unsupported.
//! 2. The host's native capability query, when it has one.
//! 3. Otherwise the presence of the host action implied by the capability.
//!    Capabilities without such an action stay unsupported.
//! 4. Version-gated capabilities also need the host SDK to meet their floor.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hostcompat_capabilities::CapabilityRegistry;
//! use hostcompat_core::{Capability, SemVer};
//!
//! let registry = CapabilityRegistry::new(host, SemVer::new(0, 1, 0)).with_cache();
//! if registry.has_capability(Capability::Haptics).await {
//!     // buzz
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cache;
mod registry;

pub use cache::CapabilityCache;
pub use registry::CapabilityRegistry;
