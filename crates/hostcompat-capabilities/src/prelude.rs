//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hostcompat_capabilities::prelude::*;` to import all essential types.

pub use crate::{CapabilityCache, CapabilityRegistry};
