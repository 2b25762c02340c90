//! Prelude module - commonly used types from every hostcompat crate.
//!
//! Use `use hostcompat::prelude::*;` to import all essential types.

pub use hostcompat_capabilities::prelude::*;
pub use hostcompat_config::prelude::*;
pub use hostcompat_core::prelude::*;
pub use hostcompat_events::prelude::*;
pub use hostcompat_features::prelude::*;
pub use hostcompat_telemetry::prelude::*;

pub use crate::{Compat, CompatBuilder, SetupError, SetupResult, init_logging};
