//! Tests for the network mediator: cache-first answers, precache lifecycle,
//! and offline synthesis.

mod common;

use tempfile::TempDir;

use common::{mediator, memory_store, monitor};
use offsync_core::mediator::{
    CacheStorage, MediatorConfig, MediatorError, Request, Response, ResponseType, StatusCode,
    NETWORK_ERROR_TEXT, QUEUED_MESSAGE,
};
use offsync_core::network::MessagePayload;

fn url(config: &MediatorConfig, path: &str) -> url::Url {
    config.resolve(path).unwrap()
}

// === Cache-First Tests ===

#[tokio::test]
async fn test_precached_asset_served_without_network() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(true));
    mediator.install().await.unwrap();
    let index = url(&config, "/index.html");
    assert_eq!(fetcher.calls_to(index.as_str()), 1);

    let response = mediator.handle_fetch(&Request::get(index.clone())).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), "<html>/index.html</html>");
    assert_eq!(fetcher.calls_to(index.as_str()), 1);
}

#[tokio::test]
async fn test_network_response_cached_until_cache_name_changes() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let store = memory_store();
    let (mediator, fetcher) = mediator(&temp, config.clone(), store.clone(), monitor(true));
    let logo = url(&config, "/logo.png");
    fetcher.route_ok(logo.as_str(), "png");

    for _ in 0..3 {
        let response = mediator.handle_fetch(&Request::get(logo.clone())).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(fetcher.calls_to(logo.as_str()), 1);

    let bumped = config.with_cache_name("offsync-cache-v2");
    let (mediator, fetcher) = common::mediator(&temp, bumped, store, monitor(true));
    fetcher.route_ok(logo.as_str(), "png");
    mediator.handle_fetch(&Request::get(logo.clone())).await;
    assert_eq!(fetcher.calls_to(logo.as_str()), 1);
}

#[tokio::test]
async fn test_cross_origin_response_is_not_cached() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config, memory_store(), monitor(true));
    let font = url::Url::parse("https://fonts.test/face.woff").unwrap();
    fetcher.route(
        font.as_str(),
        Response::new(StatusCode::OK, "font", ResponseType::Cors),
    );

    mediator.handle_fetch(&Request::get(font.clone())).await;
    mediator.handle_fetch(&Request::get(font.clone())).await;

    assert_eq!(fetcher.calls_to(font.as_str()), 2);
}

// === Lifecycle Tests ===

#[tokio::test]
async fn test_install_and_activate_twice_leaves_one_cache() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, _) = mediator(&temp, config.clone(), memory_store(), monitor(true));
    mediator.caches().open("offsync-cache-v0").unwrap();

    mediator.install().await.unwrap();
    let first = mediator.activate().unwrap();
    mediator.install().await.unwrap();
    let second = mediator.activate().unwrap();

    assert_eq!(first, vec!["offsync-cache-v0".to_string()]);
    assert!(second.is_empty());
    assert_eq!(mediator.caches().keys().unwrap(), vec![config.cache_name.clone()]);
    let cache = mediator.caches().open(&config.cache_name).unwrap();
    assert_eq!(cache.len(), config.precache.len());
}

#[tokio::test]
async fn test_failed_precache_aborts_install() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(true));
    fetcher.fail(url(&config, "/offline.html").as_str());

    let result = mediator.install().await;

    assert!(matches!(result, Err(MediatorError::Fetch(_))));
    let cache = mediator.caches().open(&config.cache_name).unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_non_ok_precache_asset_aborts_install() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default().with_precache(vec!["/missing.css".to_string()]);
    let caches = CacheStorage::new(&temp.path().join("caches")).unwrap();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(true));
    fetcher.route(
        url(&config, "/missing.css").as_str(),
        Response::new(StatusCode::NOT_FOUND, "gone", ResponseType::Basic),
    );

    let result = mediator.install().await;

    assert!(matches!(
        result,
        Err(MediatorError::Precache { status: 404, .. })
    ));
    assert!(caches.open(&config.cache_name).unwrap().is_empty());
}

// === Offline Synthesis Tests ===

#[tokio::test]
async fn test_failed_navigation_serves_offline_page() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(true));
    mediator.install().await.unwrap();
    fetcher.set_offline(true);

    let response = mediator
        .handle_fetch(&Request::navigate(url(&config, "/chat/room-1")))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), "<html>/offline.html</html>");
}

#[tokio::test]
async fn test_offline_navigation_skips_network_when_known_offline() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(false));
    mediator.install().await.unwrap();
    let before = fetcher.call_count();

    let response = mediator
        .handle_fetch(&Request::navigate(url(&config, "/settings")))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), "<html>/offline.html</html>");
    assert_eq!(fetcher.call_count(), before);
}

#[tokio::test]
async fn test_reported_online_overrides_platform_offline() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let (mediator, fetcher) = mediator(&temp, config.clone(), memory_store(), monitor(false));
    mediator.install().await.unwrap();
    mediator.record_connectivity(offsync_core::ConnectivityStatus::Online);
    let settings = url(&config, "/settings");
    fetcher.route_ok(settings.as_str(), "<html>settings</html>");

    let response = mediator.handle_fetch(&Request::navigate(settings.clone())).await;

    assert_eq!(response.text_body(), "<html>settings</html>");
    assert_eq!(fetcher.calls_to(settings.as_str()), 1);
}

#[tokio::test]
async fn test_failed_realtime_write_is_queued() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let store = memory_store();
    let (mediator, fetcher) = mediator(&temp, config.clone(), store.clone(), monitor(true));
    fetcher.set_offline(true);
    let body = MessagePayload::chat("hello later").to_json().unwrap();
    let endpoint = url::Url::parse(&config.realtime_endpoint).unwrap();

    let response = mediator
        .handle_fetch(&Request::post(endpoint, body))
        .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    let ack = response.json_body().unwrap();
    assert_eq!(ack["status"], "queued");
    assert_eq!(ack["message"], QUEUED_MESSAGE);
    assert!(ack["timestamp"].is_u64());

    let pending = store.pending_messages();
    assert_eq!(pending.len(), 1);
    assert_eq!(ack["pendingId"], pending[0].pending_id.as_str());
    assert_eq!(pending[0].payload.display_text(), Some("hello later"));
}

#[tokio::test]
async fn test_queued_write_keeps_every_field_of_the_body() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let store = memory_store();
    let (mediator, fetcher) = mediator(&temp, config.clone(), store.clone(), monitor(true));
    fetcher.set_offline(true);
    let body = r#"{"type":"message","content":"hi","timestamp":1,"sender":"alice","room":"general"}"#;
    let endpoint = url::Url::parse(&config.realtime_endpoint).unwrap();

    let response = mediator.handle_fetch(&Request::post(endpoint, body)).await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    let pending = store.pending_messages();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload.to_json().unwrap(), body);
}

#[tokio::test]
async fn test_other_failures_get_plain_503() {
    let temp = TempDir::new().unwrap();
    let config = MediatorConfig::default();
    let store = memory_store();
    let (mediator, fetcher) = mediator(&temp, config.clone(), store.clone(), monitor(true));
    fetcher.set_offline(true);

    let asset = mediator
        .handle_fetch(&Request::get(url(&config, "/logo.png")))
        .await;
    let upload = mediator
        .handle_fetch(&Request::post(url(&config, "/upload"), "data"))
        .await;

    for response in [asset, upload] {
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text_body(), NETWORK_ERROR_TEXT);
    }
    assert_eq!(store.pending_count(), 0);
}
