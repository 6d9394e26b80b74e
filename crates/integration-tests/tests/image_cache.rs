//! Image transform cache through the HTTP router.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode, header};
use storefront_cache::images::{
    DefaultSourceFetcher, IMAGE_CACHE_HEADER, ImageCache, MAX_IMAGE_DIMENSION, PLACEHOLDER_GIF,
    SourceFetcher,
};
use storefront_cache::state::AppState;
use storefront_cache::swr::{MemoryStore, SwrCache};
use storefront_cache_integration_tests::{StubCommerce, StubFetcher, StubOrigin, png};
use tower::ServiceExt;

const REMOTE_480: &str = "/api/image?src=https%3A%2F%2Fexample.com%2Fa.jpg&width=480&height=480";

fn app_with_fetcher(dir: &Path, fetcher: Arc<dyn SourceFetcher>) -> Router {
    let swr = SwrCache::new(Arc::new(MemoryStore::new(100)), StubOrigin::new(200, "{}"));
    let images = ImageCache::new(dir, fetcher);
    storefront_cache::app(AppState::from_parts(StubCommerce::new(), swr, images), false)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn cached_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_identical_requests_transform_once() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::new(800, 600);
    let app = app_with_fetcher(dir.path(), fetcher.clone());

    let (status, headers, first) = get(&app, REMOTE_480).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(headers[IMAGE_CACHE_HEADER], "miss");

    let (status, headers, second) = get(&app, REMOTE_480).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[IMAGE_CACHE_HEADER], "hit");

    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), 1);

    let decoded = image::load_from_memory(&second).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (480, 480));

    let files = cached_files(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".webp"));
}

#[tokio::test]
async fn test_different_parameters_are_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::new(800, 600);
    let app = app_with_fetcher(dir.path(), fetcher.clone());

    get(&app, REMOTE_480).await;
    let (status, _, body) = get(
        &app,
        "/api/image?src=https%3A%2F%2Fexample.com%2Fa.jpg&width=200&fit=inside",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(cached_files(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_missing_src_serves_placeholder_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::new(8, 8);
    let app = app_with_fetcher(dir.path(), fetcher.clone());

    for uri in ["/api/image?width=100", "/api/image?src=&width=100"] {
        let (status, headers, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], "image/gif");
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=0");
        assert!(!body.is_empty());
        assert_eq!(&body[..], PLACEHOLDER_GIF);
    }

    assert_eq!(fetcher.calls(), 0);
    assert!(cached_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_repeated_query_keys_use_first_value() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::new(8, 8);
    let app = app_with_fetcher(dir.path(), fetcher.clone());

    let (status, headers, body) = get(
        &app,
        "/api/image?src=https%3A%2F%2Fexample.com%2Fa.jpg&src=x&width=10&width=20",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!(decoded.width(), 10);

    let (status, headers, body) = get(&app, "/api/image?src&src&width=%ZZ").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "image/gif");
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=0");
    assert_eq!(&body[..], PLACEHOLDER_GIF);

    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_oversized_request_serves_placeholder_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::new(8, 8);
    let app = app_with_fetcher(dir.path(), fetcher.clone());

    let too_wide = format!(
        "/api/image?src=https%3A%2F%2Fexample.com%2Fa.jpg&width={}&height=3000&fit=fill",
        MAX_IMAGE_DIMENSION + 1
    );
    for uri in [
        too_wide.as_str(),
        "/api/image?src=https%3A%2F%2Fexample.com%2Fa.jpg&height=17000",
    ] {
        let (status, headers, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=0");
        assert_eq!(&body[..], PLACEHOLDER_GIF);
    }

    assert_eq!(fetcher.calls(), 0);
    assert!(cached_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_local_sources_stay_inside_public_dir() {
    let public = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("hero.png"), png(40, 20)).unwrap();

    let fetcher = DefaultSourceFetcher::new(public.path(), reqwest::Client::new());
    let app = app_with_fetcher(cache.path(), Arc::new(fetcher));

    let (status, _, body) = get(&app, "/api/image?src=%2Fhero.png&width=20").await;
    assert_eq!(status, StatusCode::OK);
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));

    let (status, _, body) = get(&app, "/api/image?src=%2F..%2Fsecret.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], PLACEHOLDER_GIF);

    let (status, _, _) = get(&app, "/api/image?src=%2Fmissing.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(cached_files(cache.path()).len(), 1);
}

#[tokio::test]
async fn test_undecodable_source_serves_placeholder() {
    let public = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("broken.png"), b"not an image").unwrap();

    let fetcher = DefaultSourceFetcher::new(public.path(), reqwest::Client::new());
    let app = app_with_fetcher(cache.path(), Arc::new(fetcher));

    let (status, _, body) = get(&app, "/api/image?src=%2Fbroken.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], PLACEHOLDER_GIF);
    assert!(cached_files(cache.path()).is_empty());
}
