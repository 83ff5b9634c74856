use super::*;
use crate::services::ports::channels;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counter_listener(counter: &Arc<AtomicUsize>) -> Listener {
    let counter = Arc::clone(counter);
    Arc::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn transition_fires_lifecycle_channel_once_per_change() {
    let core = DatasourceCore::new("test");
    let connects = Arc::new(AtomicUsize::new(0));
    core.on(channels::CONNECT, counter_listener(&connects));

    assert!(core.transition(ConnectionStatus::Connected));
    assert!(!core.transition(ConnectionStatus::Connected));
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert_eq!(core.status(), ConnectionStatus::Connected);
}

#[test]
fn once_listeners_are_dropped_after_first_dispatch() {
    let core = DatasourceCore::new("test");
    let hits = Arc::new(AtomicUsize::new(0));
    core.once("data", counter_listener(&hits));
    core.on("data", counter_listener(&hits));

    core.dispatch("data", Payload::Null);
    core.dispatch("data", Payload::Null);

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(core.listener_count("data"), 1);
}

#[test]
fn dispatch_to_unknown_channel_is_noop() {
    let core = DatasourceCore::new("test");
    core.dispatch("nothing", serde_json::json!({ "x": 1 }));
    assert_eq!(core.listener_count("nothing"), 0);
}

#[tokio::test]
async fn connect_within_times_out() {
    let core = DatasourceCore::new("slow");
    let timeouts = Arc::new(AtomicUsize::new(0));
    core.on(channels::TIMEOUT, counter_listener(&timeouts));

    let ok = core
        .connect_within(Duration::from_millis(10), futures::future::pending::<bool>())
        .await;

    assert!(!ok);
    assert_eq!(core.status(), ConnectionStatus::Timeouted);
    assert_eq!(timeouts.load(Ordering::SeqCst), 1);

    // A late out-of-band connection still moves the machine forward.
    assert!(core.transition(ConnectionStatus::Connected));
}

#[tokio::test]
async fn connect_within_refused_is_disconnected() {
    let core = DatasourceCore::new("refused");
    let ok = core
        .connect_within(Duration::from_millis(10), async { false })
        .await;
    assert!(!ok);
    assert_eq!(core.status(), ConnectionStatus::Disconnected);
}
