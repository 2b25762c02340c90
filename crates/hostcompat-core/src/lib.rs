//! Hostcompat Core - Foundation types and host contracts.
//!
//! This crate provides:
//! - Lenient semantic-version parsing and comparison ([`SemVer`])
//! - Best-effort resolution of the host's SDK version
//! - The fixed set of host [`Capability`] identifiers
//! - The [`HostSurface`] and [`PlatformSignals`] contracts, where every
//!   member is optional and defaults to "absent"
//! - Error types shared across the workspace
//!
//! # Example
//!
//! ```rust
//! use hostcompat_core::{SemVer, compare_versions, meets_minimum, parse_version};
//!
//! let current = parse_version("v0.2.1");
//! assert_eq!(current, SemVer::new(0, 2, 1));
//! assert!(meets_minimum(&current, &parse_version("0.1.0")));
//! assert!(compare_versions(&current, &parse_version("1.0")).is_lt());
//!
//! // Malformed input fails closed to the lowest version.
//! assert_eq!(parse_version("not-a-version"), SemVer::ZERO);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod capability;
pub mod error;
pub mod host;
pub mod version;

pub use capability::{Capability, HostAction};
pub use error::{CompatError, CompatResult, HostError, HostResult, panic_message};
pub use host::{
    ClientContext, ClientInfo, ColorScheme, ColorSchemeSink, ContextSink, HostContext,
    HostSurface, HostUser, LocationContext, NoHost, NoPlatform, PlatformSignals, UNKNOWN,
    VisibilitySink,
};
pub use version::{
    DEFAULT_SDK_VERSION, SemVer, VersionParseError, VersionResolution, VersionSource,
    compare_versions, current_version, meets_minimum, parse_version,
};
