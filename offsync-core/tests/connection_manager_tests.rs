//! Tests for the connection manager: reconnect backoff, heartbeat, and
//! queueing while disconnected.

mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{self, Instant};

use common::{chat, manager, memory_store, monitor};
use offsync_core::api::{CallbackHandler, ClientEvent, EventHandler};
use offsync_core::connectivity::ConnectivityStatus;
use offsync_core::network::{
    ConnectionHandle, ConnectionStatus, MessagePayload, NetworkError, SendOutcome,
    ABNORMAL_CLOSURE, NORMAL_CLOSURE, NO_STATUS_RECEIVED, RECONNECT_EXHAUSTED_ERROR,
};
use offsync_core::sync::{BackgroundSync, SYNC_TAG};

fn recorder() -> (Arc<dyn EventHandler>, Arc<Mutex<Vec<ClientEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handler = Arc::new(CallbackHandler::new(move |event: ClientEvent| {
        sink.lock().push(event)
    }));
    (handler, events)
}

#[derive(Default)]
struct RecordingSync {
    tags: Mutex<Vec<String>>,
}

impl BackgroundSync for RecordingSync {
    fn register(&self, tag: &str) -> bool {
        self.tags.lock().push(tag.to_string());
        true
    }
}

fn pings(sent: &[String]) -> usize {
    sent.iter()
        .filter(|text| {
            matches!(
                MessagePayload::parse(text),
                Ok(MessagePayload::Ping { .. })
            )
        })
        .count()
}

// === Reconnect Tests ===

#[tokio::test(start_paused = true)]
async fn test_reconnect_backoff_is_linear_and_bounded() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    let (handler, events) = recorder();
    manager.add_handler(handler);

    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();
    assert!(manager.is_connected());

    for attempt in 1..=5u32 {
        let socket = connector.socket_count() - 1;
        connector.close(socket, ABNORMAL_CLOSURE);
        manager.process_ready();

        let (scheduled, deadline) = manager.scheduled_reconnect().unwrap();
        let start = Instant::now();
        assert_eq!(scheduled, attempt);
        assert_eq!(deadline - start, Duration::from_millis(3000 * attempt as u64));

        manager.process_next().await;

        assert_eq!(Instant::now() - start, Duration::from_millis(3000 * attempt as u64));
        assert_eq!(connector.socket_count(), attempt as usize + 1);
        assert_eq!(manager.status(), ConnectionStatus::Connecting);
    }

    connector.close(5, ABNORMAL_CLOSURE);
    manager.process_ready();

    assert!(manager.scheduled_reconnect().is_none());
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    assert_eq!(connector.socket_count(), 6);
    assert!(events.lock().contains(&ClientEvent::Error {
        message: RECONNECT_EXHAUSTED_ERROR.to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_online_event_restarts_after_exhaustion() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    manager.connect().unwrap();
    for socket in 0..5 {
        connector.close(socket, ABNORMAL_CLOSURE);
        manager.process_ready();
        manager.process_next().await;
    }
    connector.close(5, ABNORMAL_CLOSURE);
    manager.process_ready();
    assert!(manager.scheduled_reconnect().is_none());

    manager.handle_connectivity(ConnectivityStatus::Online);

    assert_eq!(manager.reconnect_attempts(), 0);
    assert_eq!(connector.socket_count(), 7);
    assert_eq!(manager.status(), ConnectionStatus::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_close_without_status_schedules_reconnect() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();

    connector.close(0, NO_STATUS_RECEIVED);
    manager.process_ready();

    assert_eq!(manager.scheduled_reconnect().map(|(n, _)| n), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_close_while_offline_does_not_reconnect() {
    let mon = monitor(true);
    let (mut manager, connector) = manager(memory_store(), mon.clone());
    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();

    mon.set(ConnectivityStatus::Offline);
    connector.close(0, ABNORMAL_CLOSURE);
    manager.process_ready();

    assert!(manager.scheduled_reconnect().is_none());
    assert_eq!(manager.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_connect_cancels_scheduled_reconnect() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    manager.connect().unwrap();
    connector.close(0, ABNORMAL_CLOSURE);
    manager.process_ready();
    assert!(manager.scheduled_reconnect().is_some());

    manager.connect().unwrap();
    assert!(manager.scheduled_reconnect().is_none());
    assert_eq!(connector.socket_count(), 2);

    // The cancelled timer never opens a third socket.
    time::sleep(Duration::from_secs(10)).await;
    manager.process_ready();
    assert_eq!(connector.socket_count(), 2);
}

// === Scenario Tests ===

#[tokio::test]
async fn test_double_connect_while_connecting_opens_one_socket() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));

    manager.connect().unwrap();
    manager.connect().unwrap();

    assert_eq!(connector.socket_count(), 1);
    assert_eq!(manager.status(), ConnectionStatus::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_one_ping_per_heartbeat_and_none_after_disconnect() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();

    time::sleep(Duration::from_secs(25) + Duration::from_millis(1)).await;
    assert_eq!(pings(&connector.sent(0)), 1);

    time::sleep(Duration::from_secs(25)).await;
    assert_eq!(pings(&connector.sent(0)), 2);

    manager.disconnect();
    time::sleep(Duration::from_secs(100)).await;
    assert_eq!(pings(&connector.sent(0)), 2);
    assert_eq!(connector.closed_with(0), Some(NORMAL_CLOSURE));
}

// === Send Tests ===

#[tokio::test]
async fn test_send_while_connected_transmits() {
    let store = memory_store();
    let (mut manager, connector) = manager(store.clone(), monitor(true));
    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();

    let outcome = manager.send_message(chat("live"));

    assert_eq!(outcome, SendOutcome::Sent);
    assert_eq!(store.pending_count(), 0);
    let sent = connector.sent(0);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        MessagePayload::parse(&sent[0]).unwrap().display_text(),
        Some("live")
    );
}

#[tokio::test]
async fn test_send_while_disconnected_queues_and_registers_sync() {
    let store = memory_store();
    let (mut manager, _connector) = manager(store.clone(), monitor(false));
    let sync = Arc::new(RecordingSync::default());
    manager.set_background_sync(sync.clone());
    let (handler, events) = recorder();
    manager.add_handler(handler);

    let first = manager.send_message(chat("one"));
    let second = manager.send_message(chat("two"));

    let (a, b) = match (first, second) {
        (SendOutcome::Queued { pending_id: a }, SendOutcome::Queued { pending_id: b }) => (a, b),
        other => panic!("expected both queued, got {:?}", other),
    };
    assert_ne!(a, b);
    assert_eq!(store.pending_count(), 2);
    assert_eq!(*sync.tags.lock(), vec![SYNC_TAG.to_string(), SYNC_TAG.to_string()]);
    assert!(events
        .lock()
        .contains(&ClientEvent::MessageQueued { pending_id: a }));
}

#[tokio::test]
async fn test_open_with_queued_messages_registers_sync() {
    let store = memory_store();
    store.enqueue(chat("waiting")).unwrap();
    let (mut manager, connector) = manager(store, monitor(true));
    let sync = Arc::new(RecordingSync::default());
    manager.set_background_sync(sync.clone());

    manager.connect().unwrap();
    connector.open_socket(0);
    manager.process_ready();

    assert_eq!(*sync.tags.lock(), vec![SYNC_TAG.to_string()]);
}

// === Inbound Tests ===

#[tokio::test]
async fn test_inbound_frames_parsed_or_dropped() {
    let (mut manager, connector) = manager(memory_store(), monitor(true));
    let (handler, events) = recorder();
    manager.add_handler(handler);
    manager.connect().unwrap();
    connector.open_socket(0);

    connector.deliver(0, r#"{"type":"message","content":"hi","timestamp":1}"#);
    connector.deliver(0, r#"{"type":"presence","user":"bob"}"#);
    connector.deliver(0, "not json");
    manager.process_ready();

    let events = events.lock();
    let received: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::MessageReceived { payload } => Some(payload.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].display_text(), Some("hi"));
    assert_eq!(received[1].kind(), Some("presence"));
    assert!(events
        .iter()
        .any(|e| matches!(e, ClientEvent::MessageDropped { .. })));
    assert!(manager.is_connected());
}

// === Handle Tests ===

#[tokio::test]
async fn test_handle_follows_host_connectivity() {
    let mon = monitor(true);
    let (manager, connector) = manager(memory_store(), mon.clone());
    let (handle, task) = ConnectionHandle::spawn(manager);
    let mut status = handle.subscribe_status();

    handle.connect().await.unwrap();
    connector.open_socket(0);
    status
        .wait_for(|s| *s == ConnectionStatus::Connected)
        .await
        .unwrap();

    mon.set(ConnectivityStatus::Offline);
    status
        .wait_for(|s| *s == ConnectionStatus::Disconnected)
        .await
        .unwrap();
    assert_eq!(connector.closed_with(0), Some(NORMAL_CLOSURE));
    assert_eq!(handle.connect().await, Err(NetworkError::Offline));

    handle.connectivity(ConnectivityStatus::Online).unwrap();
    status
        .wait_for(|s| *s == ConnectionStatus::Connecting)
        .await
        .unwrap();
    assert_eq!(connector.socket_count(), 2);

    handle.shutdown().unwrap();
    task.await.unwrap();
    assert_eq!(handle.deliver(chat("late")).await, Err(NetworkError::ManagerStopped));
}

#[tokio::test]
async fn test_handle_send_and_deliver() {
    let store = memory_store();
    let (manager, connector) = manager(store.clone(), monitor(true));
    let (handle, _task) = ConnectionHandle::spawn(manager);

    assert_eq!(handle.deliver(chat("early")).await, Err(NetworkError::NotConnected));
    assert!(matches!(
        handle.send(chat("queued")).await,
        SendOutcome::Queued { .. }
    ));
    assert_eq!(store.pending_count(), 1);

    handle.connect().await.unwrap();
    connector.open_socket(0);
    handle
        .subscribe_status()
        .wait_for(|s| *s == ConnectionStatus::Connected)
        .await
        .unwrap();

    assert_eq!(handle.deliver(chat("now")).await, Ok(()));
    assert_eq!(handle.send(chat("live")).await, SendOutcome::Sent);
    assert_eq!(connector.sent(0).len(), 2);
}
