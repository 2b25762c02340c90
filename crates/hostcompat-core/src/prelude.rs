//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hostcompat_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CompatError, CompatResult, HostError, HostResult};

// Versions
pub use crate::{SemVer, VersionResolution, VersionSource};
pub use crate::{compare_versions, current_version, meets_minimum, parse_version};

// Capabilities
pub use crate::{Capability, HostAction};

// Host contracts
pub use crate::{ClientInfo, ColorScheme, HostContext, HostSurface, NoHost, NoPlatform};
pub use crate::PlatformSignals;
