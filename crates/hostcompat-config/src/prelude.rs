//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hostcompat_config::prelude::*;` to import all essential types.

// Errors
pub use crate::{ConfigError, ConfigResult};

// Configuration
pub use crate::{
    BridgeSection, CapabilitiesSection, Config, FeatureOverride, LoggingSection, SdkSection,
};

// Resolution
pub use crate::{ConfigLayer, ResolvedConfig, ShowFormat};
