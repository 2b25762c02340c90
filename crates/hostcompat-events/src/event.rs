//! Event types carried by the bus.

use std::fmt;

use chrono::{DateTime, Utc};
use hostcompat_core::{ColorScheme, HostContext, LocationContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Component that produced the event (`"host"`, `"platform"`, `"app"`, ...).
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// The closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// `ready`
    #[serde(rename = "ready")]
    Ready,
    /// `context:update`
    #[serde(rename = "context:update")]
    ContextUpdate,
    /// `location:changed`
    #[serde(rename = "location:changed")]
    LocationChanged,
    /// `visibility:changed`
    #[serde(rename = "visibility:changed")]
    VisibilityChanged,
    /// `theme:changed`
    #[serde(rename = "theme:changed")]
    ThemeChanged,
    /// `notification:received`
    #[serde(rename = "notification:received")]
    NotificationReceived,
    /// `wallet:connected`
    #[serde(rename = "wallet:connected")]
    WalletConnected,
    /// `wallet:disconnected`
    #[serde(rename = "wallet:disconnected")]
    WalletDisconnected,
    /// `error`
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [Self; 9] = [
        Self::Ready,
        Self::ContextUpdate,
        Self::LocationChanged,
        Self::VisibilityChanged,
        Self::ThemeChanged,
        Self::NotificationReceived,
        Self::WalletConnected,
        Self::WalletDisconnected,
        Self::Error,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::ContextUpdate => "context:update",
            Self::LocationChanged => "location:changed",
            Self::VisibilityChanged => "visibility:changed",
            Self::ThemeChanged => "theme:changed",
            Self::NotificationReceived => "notification:received",
            Self::WalletConnected => "wallet:connected",
            Self::WalletDisconnected => "wallet:disconnected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification delivered through the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Host-assigned notification id.
    pub id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// URL opened when the notification is tapped.
    pub target_url: Option<String>,
}

/// All events that can travel over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MiniAppEvent {
    /// The mini-app finished loading.
    Ready {
        /// Event metadata.
        metadata: EventMetadata,
    },

    /// The host pushed (or a poll observed) a new context.
    ContextUpdate {
        /// Event metadata.
        metadata: EventMetadata,
        /// The new context snapshot.
        context: HostContext,
    },

    /// The launch location changed.
    LocationChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// The new location, `None` if the host cleared it.
        location: Option<LocationContext>,
    },

    /// The document became visible or hidden.
    VisibilityChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// `true` if visible.
        visible: bool,
    },

    /// The preferred color scheme changed.
    ThemeChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// The new scheme.
        theme: ColorScheme,
    },

    /// A notification arrived.
    NotificationReceived {
        /// Event metadata.
        metadata: EventMetadata,
        /// The notification.
        notification: Notification,
    },

    /// A wallet connected.
    WalletConnected {
        /// Event metadata.
        metadata: EventMetadata,
        /// Connected account address.
        address: String,
        /// Chain id, if known.
        chain_id: Option<u64>,
    },

    /// The wallet disconnected.
    WalletDisconnected {
        /// Event metadata.
        metadata: EventMetadata,
    },

    /// Something went wrong somewhere in the mini-app.
    Error {
        /// Event metadata.
        metadata: EventMetadata,
        /// Error message.
        message: String,
        /// Optional machine-readable code.
        code: Option<String>,
    },
}

impl MiniAppEvent {
    /// The kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Ready { .. } => EventKind::Ready,
            Self::ContextUpdate { .. } => EventKind::ContextUpdate,
            Self::LocationChanged { .. } => EventKind::LocationChanged,
            Self::VisibilityChanged { .. } => EventKind::VisibilityChanged,
            Self::ThemeChanged { .. } => EventKind::ThemeChanged,
            Self::NotificationReceived { .. } => EventKind::NotificationReceived,
            Self::WalletConnected { .. } => EventKind::WalletConnected,
            Self::WalletDisconnected { .. } => EventKind::WalletDisconnected,
            Self::Error { .. } => EventKind::Error,
        }
    }

    /// Wire name of the event kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Metadata of this event.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Ready { metadata }
            | Self::ContextUpdate { metadata, .. }
            | Self::LocationChanged { metadata, .. }
            | Self::VisibilityChanged { metadata, .. }
            | Self::ThemeChanged { metadata, .. }
            | Self::NotificationReceived { metadata, .. }
            | Self::WalletConnected { metadata, .. }
            | Self::WalletDisconnected { metadata }
            | Self::Error { metadata, .. } => metadata,
        }
    }

    /// `ready` event.
    #[must_use]
    pub fn ready(source: impl Into<String>) -> Self {
        Self::Ready {
            metadata: EventMetadata::new(source),
        }
    }

    /// `context:update` event.
    #[must_use]
    pub fn context_update(source: impl Into<String>, context: HostContext) -> Self {
        Self::ContextUpdate {
            metadata: EventMetadata::new(source),
            context,
        }
    }

    /// `location:changed` event.
    #[must_use]
    pub fn location_changed(
        source: impl Into<String>,
        location: Option<LocationContext>,
    ) -> Self {
        Self::LocationChanged {
            metadata: EventMetadata::new(source),
            location,
        }
    }

    /// `visibility:changed` event.
    #[must_use]
    pub fn visibility_changed(source: impl Into<String>, visible: bool) -> Self {
        Self::VisibilityChanged {
            metadata: EventMetadata::new(source),
            visible,
        }
    }

    /// `theme:changed` event.
    #[must_use]
    pub fn theme_changed(source: impl Into<String>, theme: ColorScheme) -> Self {
        Self::ThemeChanged {
            metadata: EventMetadata::new(source),
            theme,
        }
    }

    /// `error` event.
    #[must_use]
    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            metadata: EventMetadata::new(source),
            message: message.into(),
            code: None,
        }
    }
}
