//! Contracts for the host embedding surface and platform primitives.
//!
//! Hosts differ wildly in what they expose. Every member of [`HostSurface`]
//! and [`PlatformSignals`] therefore has a default implementation that
//! reports the member as absent. An implementation overrides only what its
//! host actually offers, and callers gate every use on the result.
//!
//! | Member | Absent default |
//! |--------|----------------|
//! | [`HostSurface::is_embedded`] | `Err(HostError::Absent)` |
//! | [`HostSurface::context`] | `Err(HostError::Absent)` |
//! | [`HostSurface::query_capability`] | `Err(HostError::Absent)` |
//! | [`HostSurface::has_action`] | `false` |
//! | [`HostSurface::sdk_version`] | `None` |
//! | [`HostSurface::metadata_version`] | `Err(HostError::Absent)` |
//! | [`HostSurface::subscribe_context`] | `Err(HostError::Absent)` |
//! | [`PlatformSignals`] queries | `None` / `false` |

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, HostAction};
use crate::error::{HostError, HostResult};

/// Sentinel reported for client fields the host does not disclose.
pub const UNKNOWN: &str = "unknown";

/// Callback the host invokes when it pushes a new context.
pub type ContextSink = Arc<dyn Fn(HostContext) + Send + Sync>;

/// Callback invoked with the new visibility state (`true` = visible).
pub type VisibilitySink = Arc<dyn Fn(bool) + Send + Sync>;

/// Callback invoked with the new preferred color scheme.
pub type ColorSchemeSink = Arc<dyn Fn(ColorScheme) + Send + Sync>;

/// The external client application that loads the mini-app.
///
/// All members are optional; see the module docs for the defaults.
#[async_trait]
pub trait HostSurface: Send + Sync {
    /// Is this execution embedded in a host at all?
    async fn is_embedded(&self) -> HostResult<bool> {
        Err(HostError::absent("is_embedded"))
    }

    /// Snapshot of the user, client, and launch location.
    async fn context(&self) -> HostResult<HostContext> {
        Err(HostError::absent("context"))
    }

    /// Native capability query.
    async fn query_capability(&self, capability: Capability) -> HostResult<bool> {
        let _ = capability;
        Err(HostError::absent("query_capability"))
    }

    /// Presence check for a specific host action.
    fn has_action(&self, action: HostAction) -> bool {
        let _ = action;
        false
    }

    /// Version string the host exposes directly, if any.
    fn sdk_version(&self) -> Option<String> {
        None
    }

    /// Version lookup through the host's metadata channel.
    async fn metadata_version(&self) -> HostResult<String> {
        Err(HostError::absent("metadata_version"))
    }

    /// Register a callback for host-pushed context updates.
    ///
    /// Returns `Err(HostError::Absent)` when the host only supports
    /// pull-based context reads.
    fn subscribe_context(&self, sink: ContextSink) -> HostResult<()> {
        let _ = sink;
        Err(HostError::absent("subscribe_context"))
    }
}

/// A host that exposes nothing. Every query fails closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl HostSurface for NoHost {}

/// Preferred color scheme reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// Platform primitives: document visibility and color-scheme preference.
pub trait PlatformSignals: Send + Sync {
    /// Current visibility, if the platform reports it.
    fn visibility(&self) -> Option<bool> {
        None
    }

    /// Register for visibility changes. Returns `false` if unsupported.
    fn on_visibility_change(&self, sink: VisibilitySink) -> bool {
        let _ = sink;
        false
    }

    /// Current color-scheme preference, if the platform reports it.
    fn color_scheme(&self) -> Option<ColorScheme> {
        None
    }

    /// Register for color-scheme changes. Returns `false` if unsupported.
    fn on_color_scheme_change(&self, sink: ColorSchemeSink) -> bool {
        let _ = sink;
        false
    }
}

/// A platform with no observable signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatform;

impl PlatformSignals for NoPlatform {}

/// Context snapshot reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostContext {
    /// The signed-in user.
    pub user: Option<HostUser>,
    /// The host client's self-description.
    pub client: Option<ClientContext>,
    /// Where the mini-app was launched from.
    pub location: Option<LocationContext>,
}

/// A user as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostUser {
    /// Host-specific numeric user id.
    pub fid: u64,
    /// Handle.
    pub username: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub pfp_url: Option<String>,
}

/// The host client's self-reported identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientContext {
    /// Client name (e.g. `"warpcast"`).
    pub name: Option<String>,
    /// Client app version.
    pub version: Option<String>,
    /// Platform the client runs on (`"ios"`, `"android"`, `"web"`).
    pub platform: Option<String>,
    /// Whether the user has added this mini-app.
    pub added: bool,
}

/// Launch location reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationContext {
    /// Location type (`"cast_embed"`, `"notification"`, `"launcher"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// URL associated with the location, when there is one.
    pub url: Option<String>,
}

/// Best-effort description of the host client.
///
/// Fields the host does not disclose are set to [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
    /// Client platform.
    pub platform: String,
}

impl ClientInfo {
    /// Info for a client that disclosed nothing.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            platform: UNKNOWN.to_string(),
        }
    }

    /// Returns `true` if nothing about the client is known.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN && self.version == UNKNOWN && self.platform == UNKNOWN
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

impl From<&ClientContext> for ClientInfo {
    fn from(client: &ClientContext) -> Self {
        let or_unknown = |field: &Option<String>| {
            field
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        Self {
            name: or_unknown(&client.name),
            version: or_unknown(&client.version),
            platform: or_unknown(&client.platform),
        }
    }
}
