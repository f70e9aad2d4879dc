#![allow(clippy::unwrap_used)]
// Notification bus expiry and subscription, on tokio's paused clock.

use std::time::Duration;

use futures_util::StreamExt;
use sensorhub_core::{NotificationBus, NotificationDefaults, NotificationKind};

#[tokio::test(start_paused = true)]
async fn test_notifications_expire_by_kind() {
    let bus = NotificationBus::default();
    bus.success("saved");
    bus.error("broken");

    tokio::time::sleep(Duration::from_millis(5001)).await;
    tokio::task::yield_now().await;
    let snap = bus.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].kind, NotificationKind::Error);

    tokio::time::sleep(Duration::from_millis(3000)).await;
    tokio::task::yield_now().await;
    assert!(bus.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_persists_until_dismissed() {
    let bus = NotificationBus::default();
    let id = bus.notify_with_timeout(NotificationKind::Info, "sticky", Duration::ZERO);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(bus.len(), 1);

    bus.dismiss(id);
    assert!(bus.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_configured_defaults_apply() {
    let bus = NotificationBus::new(NotificationDefaults {
        warning: Duration::from_millis(100),
        ..NotificationDefaults::default()
    });
    bus.warning("quick");

    tokio::time::sleep(Duration::from_millis(150)).await;
    tokio::task::yield_now().await;
    assert!(bus.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_subscription_sees_changes_in_order() {
    let bus = NotificationBus::default();
    let mut sub = bus.subscribe();
    assert!(sub.current().is_empty());

    bus.info("one");
    let snap = sub.changed().await.unwrap();
    assert_eq!(snap.len(), 1);

    bus.info("two");
    let snap = sub.changed().await.unwrap();
    let messages: Vec<&str> = snap.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, ["one", "two"]);

    let mut stream = bus.subscribe().into_stream();
    let first = stream.next().await.unwrap();
    assert_eq!(first.len(), 2);

    bus.clear();
    let cleared = stream.next().await.unwrap();
    assert!(cleared.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expiry_after_bus_dropped_is_harmless() {
    let bus = NotificationBus::default();
    bus.success("orphan");
    drop(bus);
    tokio::time::sleep(Duration::from_secs(10)).await;
}
