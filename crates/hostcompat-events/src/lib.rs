//! Hostcompat Events - Typed event bus for mini-app lifecycle signals.
//!
//! This crate provides:
//! - A closed set of event kinds ([`EventKind`]) and their payloads ([`MiniAppEvent`])
//! - An [`EventBus`] with per-kind listeners, isolated listener failures, and
//!   deferred re-entrant emits
//! - Host and platform bridging ([`EventBus::initialize`]) with an optional
//!   [`ContextPoller`] for hosts that never push
//!
//! # Example
//!
//! ```rust
//! use hostcompat_events::{EventBus, EventKind, MiniAppEvent};
//!
//! let bus = EventBus::new();
//! let sub = bus.on(EventKind::VisibilityChanged, |event| {
//!     if let MiniAppEvent::VisibilityChanged { visible, .. } = event {
//!         println!("visible: {visible}");
//!     }
//! });
//!
//! bus.emit(MiniAppEvent::visibility_changed("platform", false));
//! assert!(sub.unsubscribe());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bridge;
mod bus;
mod error;
mod event;

pub use bridge::{BridgeMode, BridgeOptions, BridgeReport, ContextPoller};
pub use bus::{BridgeState, EventBus, Listener, ListenerId, Subscription};
pub use error::{EventError, EventResult};
pub use event::{EventKind, EventMetadata, MiniAppEvent, Notification};
