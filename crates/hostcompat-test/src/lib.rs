//! Hostcompat Test - Shared test utilities for hostcompat.
//!
//! This crate provides scriptable host and platform mocks plus fixtures that
//! can be used across the hostcompat crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! hostcompat-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use hostcompat_core::{Capability, HostAction, HostSurface};
//!     use hostcompat_test::MockHost;
//!
//!     #[tokio::test]
//!     async fn test_heuristic_probe() {
//!         let host = MockHost::new().with_action(HostAction::HapticFeedback);
//!
//!         assert!(host.has_action(HostAction::HapticFeedback));
//!         assert!(host.query_capability(Capability::Haptics).await.is_err());
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
