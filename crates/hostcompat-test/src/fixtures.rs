//! Test fixtures for common types.

use hostcompat_core::{
    Capability, ClientContext, HostAction, HostContext, HostUser, LocationContext,
};

use crate::mocks::MockHost;

/// A signed-in user.
#[must_use]
pub fn test_user() -> HostUser {
    HostUser {
        fid: 3,
        username: Some("dwr".to_string()),
        display_name: Some("Dan".to_string()),
        pfp_url: None,
    }
}

/// A mobile client that has not added the mini-app.
#[must_use]
pub fn warpcast_client() -> ClientContext {
    ClientContext {
        name: Some("warpcast".to_string()),
        version: Some("1.2.3".to_string()),
        platform: Some("ios".to_string()),
        added: false,
    }
}

/// Context of a mobile client launched from a cast embed.
#[must_use]
pub fn warpcast_context() -> HostContext {
    HostContext {
        user: Some(test_user()),
        client: Some(warpcast_client()),
        location: Some(LocationContext {
            kind: "cast_embed".to_string(),
            url: Some("https://example.com/app".to_string()),
        }),
    }
}

/// Context from a host that discloses nothing about itself.
#[must_use]
pub fn anonymous_context() -> HostContext {
    HostContext::default()
}

/// A modern host: native capability query, recent SDK, context push.
#[must_use]
pub fn modern_host() -> MockHost {
    MockHost::new()
        .with_context(warpcast_context())
        .with_sdk_version("0.4.0")
        .with_capability(Capability::OpenExternalUrl, true)
        .with_capability(Capability::ShareUrl, true)
        .with_capability(Capability::EthereumProvider, true)
        .with_capability(Capability::Haptics, true)
        .with_context_push()
}

/// An older host: no capability query, only a handful of actions, and a
/// version reachable only through the metadata channel.
#[must_use]
pub fn legacy_host() -> MockHost {
    MockHost::new()
        .with_context(warpcast_context())
        .with_metadata_version("0.1.0")
        .with_actions([
            HostAction::OpenUrl,
            HostAction::ComposeCast,
            HostAction::HapticFeedback,
        ])
}
