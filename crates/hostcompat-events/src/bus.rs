//! Typed publish/subscribe bus.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};
use std::time::Duration;

use hostcompat_core::panic_message;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::bridge::ContextPoller;
use crate::error::{EventError, EventResult};
use crate::event::{EventKind, MiniAppEvent};

/// A listener callback.
pub type Listener = Arc<dyn Fn(&MiniAppEvent) + Send + Sync>;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Lifecycle of the bus's host/platform bridging.
///
/// There is no teardown state: a bridged bus stays active for the life of
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Nothing has been wired yet.
    Uninitialized,
    /// Bridging is in progress.
    Initializing,
    /// Host and platform signals are wired.
    Active,
}

impl BridgeState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Initializing => 1,
            Self::Active => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            _ => Self::Active,
        }
    }
}

struct ListenerEntry {
    id: ListenerId,
    listener: Listener,
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Arc<MiniAppEvent>>,
    active: bool,
}

/// Shared state behind every clone of an [`EventBus`].
///
/// No lock is ever held while a listener runs, so listeners may freely
/// subscribe, unsubscribe, or emit.
pub(crate) struct BusInner {
    listeners: RwLock<HashMap<EventKind, Vec<ListenerEntry>>>,
    next_id: AtomicU64,
    dispatch: Mutex<DispatchQueue>,
    pub(crate) state: AtomicU8,
    pub(crate) poller: Mutex<Option<ContextPoller>>,
}

impl BusInner {
    fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            dispatch: Mutex::new(DispatchQueue::default()),
            state: AtomicU8::new(BridgeState::Uninitialized.as_u8()),
            poller: Mutex::new(None),
        }
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn add(&self, kind: EventKind, id: ListenerId, listener: Listener) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(kind)
            .or_default()
            .push(ListenerEntry { id, listener });
        trace!(listener_id = %id, event_type = %kind, "listener added");
    }

    fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&kind);
        }
        if removed {
            trace!(listener_id = %id, event_type = %kind, "listener removed");
        }
        removed
    }

    fn snapshot(&self, kind: EventKind) -> Vec<(ListenerId, Listener)> {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        listeners
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.id, Arc::clone(&entry.listener)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Queue `event` and, unless a dispatch loop is already running, drain
    /// the queue. An emit made from inside a listener lands in the queue and
    /// is delivered after the current loop finishes.
    pub(crate) fn emit(&self, event: MiniAppEvent) {
        let event_type = event.event_type();
        {
            let mut queue = self
                .dispatch
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            queue.pending.push_back(Arc::new(event));
            if queue.active {
                trace!(event_type, "emit deferred until current dispatch completes");
                return;
            }
            queue.active = true;
        }

        loop {
            let next = {
                let mut queue = self
                    .dispatch
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(next) = queue.pending.pop_front() {
                    next
                } else {
                    queue.active = false;
                    break;
                }
            };
            self.deliver(&next);
        }
    }

    fn deliver(&self, event: &MiniAppEvent) {
        let kind = event.kind();
        let snapshot = self.snapshot(kind);
        if snapshot.is_empty() {
            trace!(event_type = %kind, "no listeners for event");
            return;
        }

        trace!(
            event_type = %kind,
            listener_count = snapshot.len(),
            "dispatching event"
        );

        for (id, listener) in snapshot {
            // One faulty listener must not block delivery to the rest.
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if let Err(payload) = result {
                warn!(
                    listener_id = %id,
                    event_type = %kind,
                    panic = %panic_message(payload.as_ref()),
                    "listener panicked"
                );
            }
        }
    }

    fn count(&self, kind: Option<EventKind>) -> usize {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match kind {
            Some(kind) => listeners.get(&kind).map_or(0, Vec::len),
            None => listeners.values().map(Vec::len).sum(),
        }
    }
}

static GLOBAL_BUS: OnceLock<EventBus> = OnceLock::new();

/// Typed event bus.
///
/// Listeners are kept per [`EventKind`] in subscription order, and every
/// current listener of a kind is invoked synchronously on
/// [`emit`](Self::emit). Clones share the same listeners.
///
/// Most applications use the process-wide [`EventBus::global`] instance;
/// [`EventBus::new`] creates an isolated bus (handy in tests).
#[derive(Clone)]
pub struct EventBus {
    pub(crate) inner: Arc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count(None))
            .field("bridge_state", &self.bridge_state())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new, unbridged bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner::new()),
        }
    }

    /// The process-wide bus, created on first use.
    pub fn global() -> &'static Self {
        GLOBAL_BUS.get_or_init(|| {
            debug!("creating global event bus");
            Self::new()
        })
    }

    /// Subscribe `listener` to every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&MiniAppEvent) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        self.inner.add(kind, id, Arc::new(listener));
        Subscription::new(&self.inner, kind, id)
    }

    /// Subscribe `listener` to the next event of `kind` only.
    ///
    /// The listener removes itself before it runs, so it is delivered at
    /// most once even if it emits the same kind again.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnOnce(&MiniAppEvent) + Send + 'static,
    {
        let id = self.inner.allocate_id();
        let slot = Mutex::new(Some(listener));
        let bus = Arc::downgrade(&self.inner);

        let wrapped: Listener = Arc::new(move |event: &MiniAppEvent| {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(listener) = taken {
                if let Some(inner) = bus.upgrade() {
                    inner.remove(kind, id);
                }
                listener(event);
            }
        });

        self.inner.add(kind, id, wrapped);
        Subscription::new(&self.inner, kind, id)
    }

    /// Remove one listener. Returns `true` if it was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.remove(kind, id)
    }

    /// Remove every listener of `kind`, or of every kind when `None`.
    pub fn remove_all_listeners(&self, kind: Option<EventKind>) {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match kind {
            Some(kind) => {
                listeners.remove(&kind);
                debug!(event_type = %kind, "listeners cleared");
            },
            None => {
                listeners.clear();
                debug!("all listeners cleared");
            },
        }
    }

    /// Number of listeners for `kind`, or in total when `None`.
    #[must_use]
    pub fn listener_count(&self, kind: Option<EventKind>) -> usize {
        self.inner.count(kind)
    }

    /// Deliver `event` to every current listener of its kind.
    ///
    /// A panicking listener is logged and skipped. An emit from inside a
    /// listener is deferred until the running dispatch loop completes.
    pub fn emit(&self, event: MiniAppEvent) {
        self.inner.emit(event);
    }

    /// Wait for the next event of `kind`.
    ///
    /// With a `timeout`, returns [`EventError::Timeout`] if nothing arrives
    /// in time. The internal one-shot listener is removed on every path,
    /// including when the returned future is dropped early.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Timeout`] on deadline expiry and
    /// [`EventError::Closed`] if the waiter's listener was removed by
    /// someone else (e.g. [`remove_all_listeners`](Self::remove_all_listeners)).
    pub async fn wait_for_event(
        &self,
        kind: EventKind,
        timeout: Option<Duration>,
    ) -> EventResult<MiniAppEvent> {
        let (tx, rx) = oneshot::channel();
        let guard = UnsubscribeOnDrop(self.once(kind, move |event| {
            let _ = tx.send(event.clone());
        }));

        let received = match timeout {
            Some(limit) => {
                if let Ok(received) = tokio::time::timeout(limit, rx).await {
                    received
                } else {
                    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    debug!(event_type = %kind, timeout_ms, "wait for event timed out");
                    return Err(EventError::Timeout {
                        kind: kind.to_string(),
                        timeout_ms,
                    });
                }
            },
            None => rx.await,
        };
        drop(guard);

        received.map_err(|_| EventError::Closed {
            kind: kind.to_string(),
        })
    }

    /// Current bridging state.
    #[must_use]
    pub fn bridge_state(&self) -> BridgeState {
        BridgeState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub(crate) fn downgrade(&self) -> Weak<BusInner> {
        Arc::downgrade(&self.inner)
    }
}

/// Handle for one listener registration.
///
/// Dropping the handle does **not** unsubscribe; subscriptions persist until
/// [`unsubscribe`](Self::unsubscribe) is called.
#[derive(Debug, Clone)]
pub struct Subscription {
    bus: Weak<BusInner>,
    kind: EventKind,
    id: ListenerId,
}

impl Subscription {
    fn new(inner: &Arc<BusInner>, kind: EventKind, id: ListenerId) -> Self {
        Self {
            bus: Arc::downgrade(inner),
            kind,
            id,
        }
    }

    /// Remove the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|inner| inner.remove(self.kind, self.id))
    }

    /// The listener's id.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The subscribed event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

struct UnsubscribeOnDrop(Subscription);

impl Drop for UnsubscribeOnDrop {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&MiniAppEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&count);
        (count, move |_: &MiniAppEvent| {
            clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_new_bus_is_empty() {
        let bus = EventBus::new();
        assert_eq!(bus.listener_count(None), 0);
        assert_eq!(bus.bridge_state(), BridgeState::Uninitialized);
    }

    #[test]
    fn test_two_listeners_each_called_once() {
        let bus = EventBus::new();
        let (first, on_first) = counter();
        let (second, on_second) = counter();
        bus.on(EventKind::Ready, on_first);
        bus.on(EventKind::Ready, on_second);

        bus.emit(MiniAppEvent::ready("test"));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_only_reaches_matching_kind() {
        let bus = EventBus::new();
        let (ready, on_ready) = counter();
        bus.on(EventKind::Ready, on_ready);

        bus.emit(MiniAppEvent::visibility_changed("test", true));
        assert_eq!(ready.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_visibility_payload_delivered_and_late_listener_skipped() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            bus.on(EventKind::VisibilityChanged, move |event| {
                if let MiniAppEvent::VisibilityChanged { visible, .. } = event {
                    seen.lock().unwrap().push(*visible);
                }
            });
        }

        bus.emit(MiniAppEvent::visibility_changed("platform", false));

        let (late, on_late) = counter();
        bus.on(EventKind::VisibilityChanged, on_late);

        assert_eq!(*seen.lock().unwrap(), vec![false, false]);
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_order_follows_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            bus.on(EventKind::Ready, move |_| order.lock().unwrap().push(tag));
        }

        bus.emit(MiniAppEvent::ready("test"));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_unsubscribe_mid_emit_does_not_starve_others() {
        let bus = EventBus::new();
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let own_clone = Arc::clone(&own);
        let (first, on_first) = counter();

        let sub = bus.on(EventKind::Ready, move |event| {
            on_first(event);
            if let Some(sub) = own_clone.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        *own.lock().unwrap() = Some(sub);

        let (second, on_second) = counter();
        bus.on(EventKind::Ready, on_second);

        bus.emit(MiniAppEvent::ready("test"));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(Some(EventKind::Ready)), 1);

        bus.emit(MiniAppEvent::ready("test"));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new();
        bus.on(EventKind::Error, |_| panic!("listener exploded"));
        let (after, on_after) = counter();
        bus.on(EventKind::Error, on_after);

        bus.emit(MiniAppEvent::error("test", "boom"));
        bus.emit(MiniAppEvent::error("test", "boom again"));

        assert_eq!(after.load(Ordering::SeqCst), 2);
        assert_eq!(bus.listener_count(Some(EventKind::Error)), 2);
    }

    #[test]
    fn test_reentrant_emit_is_deferred() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        let log_a = Arc::clone(&log);
        bus.on(EventKind::Ready, move |_| {
            log_a.lock().unwrap().push("ready:a");
            inner_bus.emit(MiniAppEvent::visibility_changed("test", true));
            log_a.lock().unwrap().push("ready:a-done");
        });

        let log_b = Arc::clone(&log);
        bus.on(EventKind::Ready, move |_| log_b.lock().unwrap().push("ready:b"));

        let log_v = Arc::clone(&log);
        bus.on(EventKind::VisibilityChanged, move |_| {
            log_v.lock().unwrap().push("visibility");
        });

        bus.emit(MiniAppEvent::ready("test"));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["ready:a", "ready:a-done", "ready:b", "visibility"]
        );
    }

    #[test]
    fn test_once_delivers_a_single_time() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&count);
        bus.once(EventKind::WalletDisconnected, move |_| {
            clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.listener_count(Some(EventKind::WalletDisconnected)), 1);

        for _ in 0..3 {
            bus.emit(MiniAppEvent::WalletDisconnected {
                metadata: crate::EventMetadata::new("test"),
            });
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(Some(EventKind::WalletDisconnected)), 0);
    }

    #[test]
    fn test_off_and_remove_all() {
        let bus = EventBus::new();
        let (count, on_ready) = counter();
        let sub = bus.on(EventKind::Ready, on_ready);
        bus.on(EventKind::Ready, |_| {});
        bus.on(EventKind::Error, |_| {});
        assert_eq!(bus.listener_count(None), 3);

        assert!(bus.off(EventKind::Ready, sub.id()));
        assert!(!bus.off(EventKind::Ready, sub.id()));
        assert!(!sub.unsubscribe());
        bus.emit(MiniAppEvent::ready("test"));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        bus.remove_all_listeners(Some(EventKind::Ready));
        assert_eq!(bus.listener_count(Some(EventKind::Ready)), 0);
        assert_eq!(bus.listener_count(None), 1);

        bus.remove_all_listeners(None);
        assert_eq!(bus.listener_count(None), 0);
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let cloned = bus.clone();
        let (count, on_ready) = counter();
        cloned.on(EventKind::Ready, on_ready);

        bus.emit(MiniAppEvent::ready("test"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_bus() {
        let bus = EventBus::new();
        let sub = bus.on(EventKind::Ready, |_| {});
        drop(bus);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_global_is_shared() {
        let a = EventBus::global();
        let b = EventBus::global();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[tokio::test]
    async fn test_wait_for_event_resolves_on_emit() {
        let bus = EventBus::new();
        let emitter = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            emitter.emit(MiniAppEvent::theme_changed(
                "platform",
                hostcompat_core::ColorScheme::Dark,
            ));
        });

        let event = bus
            .wait_for_event(EventKind::ThemeChanged, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(event.kind(), EventKind::ThemeChanged);
        assert_eq!(bus.listener_count(None), 0);
    }

    #[tokio::test]
    async fn test_wait_for_event_timeout_leaves_no_listener() {
        let bus = EventBus::new();
        bus.on(EventKind::Ready, |_| {});
        let before = bus.listener_count(None);

        let result = bus
            .wait_for_event(EventKind::Ready, Some(Duration::from_millis(20)))
            .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(bus.listener_count(None), before);
    }

    #[tokio::test]
    async fn test_wait_for_event_cancelled_future_cleans_up() {
        let bus = EventBus::new();
        {
            let wait = bus.wait_for_event(EventKind::Ready, None);
            let _ = tokio::time::timeout(Duration::from_millis(10), wait).await;
        }
        assert_eq!(bus.listener_count(None), 0);
    }

    #[tokio::test]
    async fn test_wait_for_event_closed_when_listener_removed() {
        let bus = EventBus::new();
        let clearer = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            clearer.remove_all_listeners(None);
        });

        let result = bus
            .wait_for_event(EventKind::Ready, Some(Duration::from_secs(5)))
            .await;
        assert!(matches!(result, Err(EventError::Closed { .. })));
    }
}
