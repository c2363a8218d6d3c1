//! Tests for draining the pending queue.

mod common;

use proptest::prelude::*;

use common::strategies::drain_plan_strategy;
use common::{chat, memory_store, ScriptedRedeliver};
use offsync_core::mediator::{MockFetcher, Response, ResponseType, StatusCode};
use offsync_core::sync::{FetchRedelivery, SyncCoordinator, SYNC_TAG};

fn contents(store: &offsync_core::storage::QueueStore) -> Vec<String> {
    store
        .pending_messages()
        .iter()
        .filter_map(|m| m.payload.display_text().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_failed_entry_is_all_that_remains() {
    let store = memory_store();
    for content in ["m1", "m2", "m3"] {
        store.enqueue(chat(content)).unwrap();
    }
    let redeliver = ScriptedRedeliver::failing(&["m2"]);
    let coordinator = SyncCoordinator::new(store.clone(), redeliver.clone());

    let report = coordinator.handle_sync(SYNC_TAG).await.unwrap();

    assert_eq!(report.synced, 2);
    assert_eq!(report.remaining, 1);
    assert_eq!(contents(&store), vec!["m2"]);
    assert_eq!(redeliver.delivered(), vec!["m1", "m3"]);
}

#[tokio::test]
async fn test_second_drain_delivers_the_rest() {
    let store = memory_store();
    store.enqueue(chat("a")).unwrap();
    store.enqueue(chat("b")).unwrap();
    let redeliver = ScriptedRedeliver::failing(&["a"]);
    let coordinator = SyncCoordinator::new(store.clone(), redeliver.clone());

    coordinator.sync_pending_messages().await.unwrap();
    redeliver.heal();
    let report = coordinator.sync_pending_messages().await.unwrap();

    assert_eq!((report.synced, report.remaining), (1, 0));
    assert_eq!(store.pending_count(), 0);
    assert!(coordinator.sync_pending_messages().await.is_none());
}

#[tokio::test]
async fn test_fetch_redelivery_posts_to_outbox() {
    let store = memory_store();
    store.enqueue(chat("first")).unwrap();
    store.enqueue(chat("second")).unwrap();

    let outbox = url::Url::parse("http://localhost:3000/api/outbox").unwrap();
    let fetcher = MockFetcher::new();
    fetcher.route(
        outbox.as_str(),
        Response::new(StatusCode::CREATED, "{}", ResponseType::Basic),
    );
    let redelivery = FetchRedelivery::new(fetcher.clone(), outbox.clone());
    let coordinator = SyncCoordinator::new(store.clone(), redelivery);

    let report = coordinator.sync_pending_messages().await.unwrap();
    assert_eq!((report.synced, report.remaining), (2, 0));
    assert_eq!(
        fetcher.calls(),
        vec![
            ("POST".to_string(), outbox.to_string()),
            ("POST".to_string(), outbox.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_outbox_keeps_queue() {
    let store = memory_store();
    store.enqueue(chat("stuck")).unwrap();
    let outbox = url::Url::parse("http://localhost:3000/api/outbox").unwrap();
    let fetcher = MockFetcher::new();
    fetcher.set_offline(true);
    let coordinator = SyncCoordinator::new(store.clone(), FetchRedelivery::new(fetcher, outbox));

    let report = coordinator.sync_pending_messages().await.unwrap();

    assert_eq!((report.synced, report.remaining), (0, 1));
    assert_eq!(contents(&store), vec!["stuck"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_drain_keeps_exactly_the_failures_in_order(plan in drain_plan_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = memory_store();
        // Tag each entry with its position so duplicate contents stay distinct.
        let entries: Vec<(String, bool)> = plan
            .into_iter()
            .enumerate()
            .map(|(i, (content, fails))| (format!("{}:{}", i, content), fails))
            .collect();
        for (content, _) in &entries {
            store.enqueue(chat(content)).unwrap();
        }
        let failing: Vec<&str> = entries
            .iter()
            .filter(|(_, fails)| *fails)
            .map(|(content, _)| content.as_str())
            .collect();
        let redeliver = ScriptedRedeliver::failing(&failing);
        let coordinator = SyncCoordinator::new(store.clone(), redeliver);

        let report = runtime.block_on(coordinator.sync_pending_messages());

        let expected: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        prop_assert_eq!(contents(&store), expected);
        match report {
            None => prop_assert!(entries.is_empty()),
            Some(report) => {
                prop_assert_eq!(report.synced, entries.len() - failing.len());
                prop_assert_eq!(report.remaining, failing.len());
            }
        }
    }
}
