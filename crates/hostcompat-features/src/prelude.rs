//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hostcompat_features::prelude::*;` to import all essential types.

pub use crate::{CompatibilityReport, FeatureAvailability, FeatureAvailabilityService};

pub use crate::{Action, Invoked, PolyfillRegistry, SafeInvoker, safe_invoke};
