//! Serve path for transformed images.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use storefront_cache_core::image_key;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::placeholder::placeholder_response;
use super::transform::transform;
use super::{
    IMAGE_CACHE_HEADER, IMMUTABLE_CACHE_CONTROL, ImageCacheError, ImageQuery, SourceFetcher,
};

/// Body of an [`ImageResponse`].
#[derive(Debug)]
pub enum ImageBody {
    /// In-memory bytes.
    Bytes(Bytes),
    /// An open cache file, streamed on send.
    File(File),
}

/// Response produced by [`ImageCache::serve`].
#[derive(Debug)]
pub struct ImageResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: ImageBody,
}

impl ImageResponse {
    fn transformed(body: ImageBody, cache_status: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![
                (header::CONTENT_TYPE, HeaderValue::from_static("image/webp")),
                (
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
                ),
                (
                    HeaderName::from_static(IMAGE_CACHE_HEADER),
                    HeaderValue::from_static(cache_status),
                ),
            ],
            body,
        }
    }

    /// Look up a header value.
    #[must_use]
    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .and_then(|(_, value)| value.to_str().ok())
    }

    /// Value of [`IMAGE_CACHE_HEADER`], if set.
    #[must_use]
    pub fn cache_status(&self) -> Option<&str> {
        self.header(HeaderName::from_static(IMAGE_CACHE_HEADER))
    }
}

impl IntoResponse for ImageResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            ImageBody::Bytes(bytes) => Body::from(bytes),
            ImageBody::File(file) => Body::from_stream(ReaderStream::new(file)),
        };

        let mut response = (self.status, body).into_response();
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        response
    }
}

/// Content-addressed cache of transformed images.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<ImageCacheInner>,
}

struct ImageCacheInner {
    cache_dir: PathBuf,
    fetcher: Arc<dyn SourceFetcher>,
}

impl ImageCache {
    /// Create a cache writing under `cache_dir`.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            inner: Arc::new(ImageCacheInner {
                cache_dir: cache_dir.into(),
                fetcher,
            }),
        }
    }

    /// Directory holding cached files.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    /// Path of the cached file for a request.
    #[must_use]
    pub fn cached_path(&self, method: &str, request_url: &str, query: &ImageQuery) -> PathBuf {
        let key = image_key(
            method,
            request_url,
            query.width,
            query.height,
            query.fit.as_str(),
        );
        self.inner.cache_dir.join(format!("{key}.webp"))
    }

    /// Serve an image request. Never fails; errors become the placeholder.
    #[instrument(skip(self, query), fields(src = query.src.as_deref().unwrap_or_default()))]
    pub async fn serve(
        &self,
        method: &str,
        request_url: &str,
        query: &ImageQuery,
    ) -> ImageResponse {
        let Some(src) = query.src.as_deref() else {
            debug!("Missing image src");
            return placeholder_response();
        };
        if query.exceeds_size_limit() {
            debug!(width = ?query.width, height = ?query.height, "Image size over limit");
            return placeholder_response();
        }

        let path = self.cached_path(method, request_url, query);

        if let Some(file) = open_cached(&path).await {
            debug!(path = %path.display(), "Image cache hit");
            return ImageResponse::transformed(ImageBody::File(file), "hit");
        }

        info!(src, "Image cache miss");
        match self.populate(src, &path, query).await {
            Ok(encoded) => ImageResponse::transformed(ImageBody::Bytes(encoded), "miss"),
            Err(e) => {
                error!(error = %e, src, "Failed to transform image");
                placeholder_response()
            }
        }
    }

    async fn populate(
        &self,
        src: &str,
        path: &Path,
        query: &ImageQuery,
    ) -> Result<Bytes, ImageCacheError> {
        let source = self.inner.fetcher.fetch(src).await?;

        let (width, height, fit) = (query.width, query.height, query.fit);
        let encoded: Bytes =
            tokio::task::spawn_blocking(move || transform(&source, width, height, fit))
                .await??
                .into();

        tokio::fs::create_dir_all(&self.inner.cache_dir).await?;
        let tmp = self.inner.cache_dir.join(format!("tmp_{}", Uuid::new_v4()));

        if let Err(e) = write_then_rename(&tmp, path, &encoded).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(encoded)
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("cache_dir", &self.inner.cache_dir)
            .finish_non_exhaustive()
    }
}

async fn open_cached(path: &Path) -> Option<File> {
    let file = File::open(path).await.ok()?;
    let metadata = file.metadata().await.ok()?;
    metadata.is_file().then_some(file)
}

/// Readers only ever see a complete file at `path`.
async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, path).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FailingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceFetcher for FailingFetcher {
        async fn fetch(&self, _src: &str) -> Result<Bytes, ImageCacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ImageCacheError::UpstreamStatus(404))
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_serves_placeholder_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FailingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(dir.path(), fetcher.clone());
        let query = ImageQuery::new("https://example.com/missing.jpg");

        let response = cache.serve("GET", "/api/image?src=x", &query).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FailingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(dir.path(), fetcher.clone());
        let query = ImageQuery::new("/a.png");
        std::fs::write(cache.cached_path("GET", "/u", &query), b"webp").unwrap();

        let response = cache.serve("GET", "/u", &query).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.cache_status(), Some("hit"));
        assert_eq!(
            response.header(header::CACHE_CONTROL),
            Some(IMMUTABLE_CACHE_CONTROL)
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cached_path_shape() {
        let cache = ImageCache::new(
            "/tmp/images",
            Arc::new(FailingFetcher {
                calls: AtomicUsize::new(0),
            }),
        );
        let path = cache.cached_path("GET", "/u", &ImageQuery::new("/a.png"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(".webp"));
        assert_eq!(name.len(), 64 + ".webp".len());
    }
}
