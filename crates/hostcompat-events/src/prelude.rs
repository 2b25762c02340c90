//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hostcompat_events::prelude::*;` to import all essential types.

pub use crate::{EventError, EventResult};

pub use crate::{EventBus, EventKind, MiniAppEvent, Subscription};

pub use crate::{BridgeMode, BridgeOptions, BridgeState};
