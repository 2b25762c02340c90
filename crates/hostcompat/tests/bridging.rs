//! Integration tests for host and platform bridging through the `Compat`
//! facade: context pushes, polling, platform signals, and cache
//! invalidation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hostcompat::prelude::*;
use hostcompat_test::{MockHost, MockPlatform, fixtures};

#[tokio::test]
async fn test_context_push_invalidates_capability_cache() {
    let host = fixtures::modern_host();
    let compat = Compat::builder()
        .host(host.clone())
        .isolated()
        .build()
        .unwrap();

    let bridge = compat.bridge().unwrap();
    assert!(bridge.context_push);
    assert!(!bridge.polling);

    assert!(compat.has_capability(Capability::ShareUrl).await);
    host.set_capability(Capability::ShareUrl, false);
    assert!(compat.has_capability(Capability::ShareUrl).await);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = compat.bus().on(EventKind::ContextUpdate, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    assert_eq!(host.push_context(fixtures::anonymous_context()), 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(!compat.has_capability(Capability::ShareUrl).await);
}

#[tokio::test]
async fn test_platform_signals_reach_listeners() {
    let platform = MockPlatform::new();
    let compat = Compat::builder()
        .host(MockHost::new())
        .platform(platform.clone())
        .isolated()
        .build()
        .unwrap();

    let bridge = compat.bridge().unwrap();
    assert!(bridge.visibility);
    assert!(bridge.color_scheme);

    let visibility = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&visibility);
    let _sub = compat.bus().on(EventKind::VisibilityChanged, move |event| {
        if let MiniAppEvent::VisibilityChanged { visible, .. } = event {
            sink.lock().unwrap().push(*visible);
        }
    });

    platform.fire_visibility(false);
    platform.fire_visibility(true);
    assert_eq!(*visibility.lock().unwrap(), vec![false, true]);

    let theme = compat.bus().wait_for_event(EventKind::ThemeChanged, Some(Duration::from_millis(50)));
    let (event, fired) = tokio::join!(theme, async {
        tokio::task::yield_now().await;
        platform.fire_color_scheme(ColorScheme::Dark)
    });
    assert_eq!(fired, 1);
    assert!(matches!(
        event.unwrap(),
        MiniAppEvent::ThemeChanged {
            theme: ColorScheme::Dark,
            ..
        }
    ));
}

#[tokio::test]
async fn test_disabled_signals_are_not_wired() {
    let mut config = Config::default();
    config.bridge.visibility = false;
    config.bridge.color_scheme = false;

    let platform = MockPlatform::new();
    let compat = Compat::builder()
        .platform(platform.clone())
        .config(config)
        .isolated()
        .build()
        .unwrap();

    let bridge = compat.bridge().unwrap();
    assert!(!bridge.visibility && !bridge.color_scheme);
    assert_eq!(platform.fire_visibility(false), 0);
}

#[tokio::test]
async fn test_poll_mode_observes_context_changes() {
    let host = MockHost::new().with_context(fixtures::warpcast_context());
    let mut config = Config::default();
    config.bridge.mode = "poll".to_owned();
    config.bridge.poll_interval_ms = 100;

    let compat = Compat::builder()
        .host(host.clone())
        .config(config)
        .isolated()
        .build()
        .unwrap();
    assert!(compat.bridge().unwrap().polling);
    assert!(compat.bus().is_polling());

    // Let the first poll record its baseline before changing the context.
    tokio::time::timeout(Duration::from_secs(2), async {
        while host.calls().context_reads == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    host.set_context(fixtures::anonymous_context());
    let event = compat
        .bus()
        .wait_for_event(EventKind::ContextUpdate, Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert!(matches!(
        event,
        MiniAppEvent::ContextUpdate { ref context, .. } if context.client.is_none()
    ));
}

#[tokio::test]
async fn test_drop_detaches_invalidation() {
    let host = fixtures::modern_host();
    let compat = Compat::builder()
        .host(host.clone())
        .isolated()
        .build()
        .unwrap();
    let bus = compat.bus().clone();
    assert_eq!(bus.listener_count(Some(EventKind::ContextUpdate)), 1);

    drop(compat);
    assert_eq!(bus.listener_count(Some(EventKind::ContextUpdate)), 0);
    assert_eq!(bus.bridge_state(), BridgeState::Active);
}

#[tokio::test]
async fn test_second_instance_on_same_bus_does_not_rebridge() {
    let bus = EventBus::new();
    let first = Compat::builder()
        .host(fixtures::modern_host())
        .bus(bus.clone())
        .polyfills(PolyfillRegistry::new())
        .build()
        .unwrap();
    let second = Compat::builder()
        .host(fixtures::modern_host())
        .bus(bus.clone())
        .polyfills(first.polyfills().clone())
        .build()
        .unwrap();

    assert!(first.bridge().is_some());
    assert!(second.bridge().is_none());
    assert_eq!(bus.listener_count(Some(EventKind::ContextUpdate)), 2);
}

#[tokio::test]
async fn test_polling_survives_drop_of_bridging_instance() {
    let host = MockHost::new().with_context(fixtures::warpcast_context());
    let mut config = Config::default();
    config.bridge.mode = "poll".to_owned();
    config.bridge.poll_interval_ms = 100;

    let bus = EventBus::new();
    let build = || {
        Compat::builder()
            .host(host.clone())
            .config(config.clone())
            .bus(bus.clone())
            .polyfills(PolyfillRegistry::new())
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();
    assert!(first.bridge().unwrap().polling);
    assert!(second.bridge().is_none());

    tokio::time::timeout(Duration::from_secs(2), async {
        while host.calls().context_reads == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    drop(first);
    assert!(second.bus().is_polling());

    host.set_context(fixtures::anonymous_context());
    let event = second
        .bus()
        .wait_for_event(EventKind::ContextUpdate, Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert!(matches!(
        event,
        MiniAppEvent::ContextUpdate { ref context, .. } if context.client.is_none()
    ));
}
