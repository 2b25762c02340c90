//! Wiring host and platform signals onto an [`EventBus`].
//!
//! Bridging happens at most once per bus. Host context pushes become
//! `context:update` (plus `location:changed` when the launch location moves),
//! platform visibility changes become `visibility:changed`, and color-scheme
//! changes become `theme:changed`.
//!
//! Hosts without a push primitive can be observed through a
//! [`ContextPoller`] instead (see [`BridgeMode`]).

use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use hostcompat_core::{CompatError, HostContext, HostSurface, PlatformSignals};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::bus::{BridgeState, BusInner, EventBus};
use crate::event::MiniAppEvent;

/// Floor for the polling interval. `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How host context changes are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeMode {
    /// Rely on the host's push primitive only.
    #[default]
    Push,
    /// Poll the host's context on an interval.
    Poll,
    /// Subscribe to pushes and also poll.
    PushAndPoll,
}

impl BridgeMode {
    /// Whether this mode subscribes to host pushes.
    #[must_use]
    pub const fn pushes(self) -> bool {
        matches!(self, Self::Push | Self::PushAndPoll)
    }

    /// Whether this mode polls the host.
    #[must_use]
    pub const fn polls(self) -> bool {
        matches!(self, Self::Poll | Self::PushAndPoll)
    }
}

impl FromStr for BridgeMode {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "push" => Ok(Self::Push),
            "poll" => Ok(Self::Poll),
            "push-and-poll" => Ok(Self::PushAndPoll),
            other => Err(CompatError::UnknownIdentifier {
                kind: "bridge mode",
                name: other.to_string(),
            }),
        }
    }
}

/// Options for [`EventBus::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// How context changes are observed.
    pub mode: BridgeMode,
    /// Interval between context polls.
    pub poll_interval: Duration,
    /// Forward platform visibility changes.
    pub visibility: bool,
    /// Forward platform color-scheme changes.
    pub color_scheme: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            mode: BridgeMode::Push,
            poll_interval: Duration::from_secs(5),
            visibility: true,
            color_scheme: true,
        }
    }
}

/// What [`EventBus::initialize`] managed to wire.
#[derive(Debug, Default)]
pub struct BridgeReport {
    /// Host context pushes are forwarded.
    pub context_push: bool,
    /// Platform visibility changes are forwarded.
    pub visibility: bool,
    /// Platform color-scheme changes are forwarded.
    pub color_scheme: bool,
    /// A context poller was started. The bus owns it for the rest of its
    /// lifetime.
    pub polling: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForwardPolicy {
    /// Emit every observation.
    Always,
    /// Emit only when the context differs from the last one seen. The very
    /// first observation only records a baseline.
    OnChange,
}

/// Turns context observations into bus events.
///
/// Push and poll paths share one forwarder so a context seen through both
/// is announced once.
struct ContextForwarder {
    bus: Weak<BusInner>,
    last: Mutex<Option<HostContext>>,
    source: &'static str,
}

impl ContextForwarder {
    fn new(bus: &EventBus, source: &'static str) -> Self {
        Self {
            bus: bus.downgrade(),
            last: Mutex::new(None),
            source,
        }
    }

    /// Returns `false` once the bus is gone.
    fn forward(&self, context: HostContext, policy: ForwardPolicy) -> bool {
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };

        let previous = self
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(context.clone());

        match (&previous, policy) {
            (None, ForwardPolicy::OnChange) => return true,
            (Some(prev), ForwardPolicy::OnChange) if *prev == context => return true,
            _ => {},
        }

        let location_changed = previous
            .as_ref()
            .is_some_and(|prev| prev.location != context.location);
        let location = context.location.clone();

        inner.emit(MiniAppEvent::context_update(self.source, context));
        if location_changed {
            inner.emit(MiniAppEvent::location_changed(self.source, location));
        }
        true
    }
}

/// Background task that polls the host's context and emits on change.
///
/// The task stops on its own when the bus is dropped or when the host turns
/// out to have no context read at all. Dropping the handle stops it too.
#[derive(Debug)]
pub struct ContextPoller {
    handle: JoinHandle<()>,
}

impl ContextPoller {
    /// Start polling `host` every `interval`, emitting onto `bus`.
    ///
    /// Returns `None` when called outside a tokio runtime.
    #[must_use]
    pub fn spawn(bus: &EventBus, host: Arc<dyn HostSurface>, interval: Duration) -> Option<Self> {
        Self::spawn_with(Arc::new(ContextForwarder::new(bus, "host-poll")), host, interval)
    }

    fn spawn_with(
        forwarder: Arc<ContextForwarder>,
        host: Arc<dyn HostSurface>,
        interval: Duration,
    ) -> Option<Self> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; context polling disabled");
            return None;
        };

        let interval = interval.max(MIN_POLL_INTERVAL);
        debug!(interval_ms = interval.as_millis(), "starting context poller");

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match host.context().await {
                    Ok(context) => {
                        if !forwarder.forward(context, ForwardPolicy::OnChange) {
                            debug!("event bus dropped; stopping context poller");
                            break;
                        }
                    },
                    Err(e) if e.is_absent() => {
                        debug!("host exposes no context read; stopping context poller");
                        break;
                    },
                    Err(e) => warn!(error = %e, "context poll failed"),
                }
            }
        });

        Some(Self { handle })
    }

    /// Stop polling.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Returns `true` while the polling task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ContextPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl EventBus {
    /// Returns `true` while the poller started by [`initialize`](Self::initialize)
    /// is alive.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(ContextPoller::is_running)
    }

    /// Bridge `host` and `platform` onto this bus.
    ///
    /// Only the first call does anything; later calls return `None`. Signals
    /// that the host or platform do not offer are skipped silently.
    pub fn initialize(
        &self,
        host: Arc<dyn HostSurface>,
        platform: Arc<dyn PlatformSignals>,
        options: &BridgeOptions,
    ) -> Option<BridgeReport> {
        if self
            .inner
            .state
            .compare_exchange(
                BridgeState::Uninitialized.as_u8(),
                BridgeState::Initializing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!("event bus already bridged");
            return None;
        }

        info!(mode = ?options.mode, "bridging host and platform signals onto event bus");

        let forwarder = Arc::new(ContextForwarder::new(self, "host"));
        let mut report = BridgeReport::default();

        if options.mode.pushes() {
            let push = Arc::clone(&forwarder);
            match host.subscribe_context(Arc::new(move |context| {
                push.forward(context, ForwardPolicy::Always);
            })) {
                Ok(()) => report.context_push = true,
                Err(e) if e.is_absent() => {
                    info!("host has no context push; context changes need polling to be observed");
                },
                Err(e) => warn!(error = %e, "failed to subscribe to host context updates"),
            }
        }

        if options.visibility {
            let bus = self.downgrade();
            report.visibility = platform.on_visibility_change(Arc::new(move |visible| {
                if let Some(inner) = bus.upgrade() {
                    inner.emit(MiniAppEvent::visibility_changed("platform", visible));
                }
            }));
        }

        if options.color_scheme {
            let bus = self.downgrade();
            report.color_scheme = platform.on_color_scheme_change(Arc::new(move |scheme| {
                if let Some(inner) = bus.upgrade() {
                    inner.emit(MiniAppEvent::theme_changed("platform", scheme));
                }
            }));
        }

        if options.mode.polls() {
            if let Some(poller) = ContextPoller::spawn_with(forwarder, host, options.poll_interval) {
                *self
                    .inner
                    .poller
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(poller);
                report.polling = true;
            }
        }

        self.inner
            .state
            .store(BridgeState::Active.as_u8(), Ordering::Release);

        debug!(
            context_push = report.context_push,
            visibility = report.visibility,
            color_scheme = report.color_scheme,
            polling = report.polling,
            "event bus bridged"
        );
        Some(report)
    }
}
