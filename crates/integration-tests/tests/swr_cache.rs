//! Stale-while-revalidate cache behavior against stub origins and stores.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use storefront_cache::swr::{
    CacheStatus, KeyValueStore, MaxAge, MemoryStore, OriginRequest, SWR_CACHE_HEADER, SwrCache,
};
use storefront_cache_integration_tests::{FailingStore, StubOrigin};

const URL: &str = "https://shop.example.test/api/2021-10/graphql.json";

fn request() -> OriginRequest {
    OriginRequest::new(Method::POST, URL)
        .header("Accept-Language", "en")
        .header("Content-Type", "application/json")
        .body(r#"{"query":"{ shop { name } }"}"#)
}

fn max_age() -> MaxAge {
    MaxAge::from_secs(60)
}

#[tokio::test]
async fn test_miss_then_hit() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(200, r#"{"data":1}"#);
    let cache = SwrCache::new(store, origin.clone());

    let first = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(first.cache_status, CacheStatus::Miss);
    assert_eq!(first.header(SWR_CACHE_HEADER), Some("miss"));
    assert_eq!(first.header("content-type"), Some("application/json"));

    cache.wait_for_background().await;

    let second = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(second.cache_status, CacheStatus::Hit);
    assert_eq!(second.header(SWR_CACHE_HEADER), Some("hit"));
    assert_eq!(second.body, first.body);
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn test_missing_marker_serves_stale_and_refreshes() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(200, "v1");
    let cache = SwrCache::new(store.clone(), origin.clone());

    cache.fetch(request(), &max_age()).await.unwrap();
    cache.wait_for_background().await;

    let key = request().cache_key();
    store.delete(&SwrCache::still_good_key(&key)).await.unwrap();
    origin.set_reply(200, "v2");

    let stale = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(stale.cache_status, CacheStatus::Stale);
    assert_eq!(stale.header(SWR_CACHE_HEADER), Some("stale"));
    assert_eq!(&stale.body[..], b"v1");

    cache.wait_for_background().await;
    assert_eq!(origin.calls(), 2);

    let refreshed = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(refreshed.cache_status, CacheStatus::Hit);
    assert_eq!(&refreshed.body[..], b"v2");
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_serving_stale() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(200, "v1");
    let cache = SwrCache::new(store, origin.clone());

    cache.fetch(request(), &MaxAge::from_secs(0)).await.unwrap();
    cache.wait_for_background().await;

    origin.set_failing(true);
    let stale = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(stale.cache_status, CacheStatus::Stale);
    cache.wait_for_background().await;

    let again = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(again.cache_status, CacheStatus::Stale);
    assert_eq!(&again.body[..], b"v1");
}

#[tokio::test]
async fn test_store_failure_fails_open() {
    let origin = StubOrigin::new(200, r#"{"data":1}"#);
    let cache = SwrCache::new(Arc::new(FailingStore), origin.clone());

    let response = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.cache_status, CacheStatus::Miss);
    assert_eq!(&response.body[..], br#"{"data":1}"#);

    cache.wait_for_background().await;

    let again = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(again.cache_status, CacheStatus::Miss);
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn test_error_responses_are_not_cached() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(404, "not found");
    let cache = SwrCache::new(store.clone(), origin.clone());

    let first = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(first.status, 404);
    assert_eq!(first.cache_status, CacheStatus::Miss);
    cache.wait_for_background().await;

    let key = request().cache_key();
    assert_eq!(store.get(&SwrCache::response_key(&key)).await.unwrap(), None);
    assert_eq!(store.get(&SwrCache::still_good_key(&key)).await.unwrap(), None);

    let second = cache.fetch(request(), &max_age()).await.unwrap();
    assert_eq!(second.status, 404);
    assert_eq!(second.cache_status, CacheStatus::Miss);
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn test_origin_failure_on_miss_propagates() {
    let origin = StubOrigin::new(200, "unused");
    origin.set_failing(true);
    let cache = SwrCache::new(Arc::new(MemoryStore::new(100)), origin.clone());

    assert!(cache.fetch(request(), &max_age()).await.is_err());
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_stale_reads_refresh_once() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(200, "v1");
    let cache = SwrCache::new(store, origin.clone());

    cache.fetch(request(), &MaxAge::from_secs(0)).await.unwrap();
    cache.wait_for_background().await;

    origin.set_delay(Duration::from_millis(200));
    for _ in 0..5 {
        let stale = cache.fetch(request(), &max_age()).await.unwrap();
        assert_eq!(stale.cache_status, CacheStatus::Stale);
    }
    assert_eq!(cache.refreshes_in_flight(), 1);

    cache.wait_for_background().await;
    assert_eq!(cache.refreshes_in_flight(), 0);
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn test_distinct_requests_are_cached_separately() {
    let store = Arc::new(MemoryStore::new(100));
    let origin = StubOrigin::new(200, "body");
    let cache = SwrCache::new(store, origin.clone());

    let english = request();
    let spanish = OriginRequest::new(Method::POST, URL)
        .header("Accept-Language", "es")
        .header("Content-Type", "application/json")
        .body(r#"{"query":"{ shop { name } }"}"#);

    cache.fetch(english, &max_age()).await.unwrap();
    cache.wait_for_background().await;

    let response = cache.fetch(spanish, &max_age()).await.unwrap();
    assert_eq!(response.cache_status, CacheStatus::Miss);
    assert_eq!(origin.calls(), 2);
}
