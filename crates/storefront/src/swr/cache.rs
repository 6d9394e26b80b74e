//! The stale-while-revalidate fetch path.

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use storefront_cache_core::CacheKey;
use tokio_util::task::TaskTracker;
use tracing::{debug, instrument, warn};

use super::origin::{Origin, OriginError, OriginRequest};
use super::response::{CacheStatus, CachedResponse, SwrResponse};
use super::store::{KeyValueStore, StoreError};
use super::{RESPONSE_PREFIX, STILL_GOOD_PREFIX};

/// Freshness window for a cached response.
#[derive(Clone)]
pub enum MaxAge {
    /// Same window for every request.
    Fixed(Duration),
    /// Window derived from the request.
    Computed(Arc<dyn Fn(&OriginRequest) -> Duration + Send + Sync>),
}

impl MaxAge {
    /// Fixed window in whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self::Fixed(Duration::from_secs(secs))
    }

    /// Resolve the window for one request.
    #[must_use]
    pub fn resolve(&self, request: &OriginRequest) -> Duration {
        match self {
            Self::Fixed(duration) => *duration,
            Self::Computed(compute) => compute(request),
        }
    }
}

impl fmt::Debug for MaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Stale-while-revalidate cache in front of an [`Origin`].
///
/// Only status 200 responses are stored and served from cache. Store failures
/// never fail a request: unreadable entries are treated as misses and write
/// failures are logged.
///
/// Background refreshes are single-flighted per key and tracked so callers
/// can wait for them with [`SwrCache::wait_for_background`].
#[derive(Clone)]
pub struct SwrCache {
    inner: Arc<SwrCacheInner>,
}

struct SwrCacheInner {
    store: Arc<dyn KeyValueStore>,
    origin: Arc<dyn Origin>,
    tasks: TaskTracker,
    /// Serializes [`SwrCache::wait_for_background`], which closes and reopens
    /// `tasks`.
    draining: tokio::sync::Mutex<()>,
    refreshing: DashSet<CacheKey>,
}

impl SwrCache {
    /// Create a cache over a shared store and origin.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, origin: Arc<dyn Origin>) -> Self {
        Self {
            inner: Arc::new(SwrCacheInner {
                store,
                origin,
                tasks: TaskTracker::new(),
                draining: tokio::sync::Mutex::new(()),
                refreshing: DashSet::new(),
            }),
        }
    }

    /// Store key holding the serialized response for `key`.
    #[must_use]
    pub fn response_key(key: &CacheKey) -> String {
        format!("{RESPONSE_PREFIX}{key}")
    }

    /// Store key holding the freshness marker for `key`.
    #[must_use]
    pub fn still_good_key(key: &CacheKey) -> String {
        format!("{STILL_GOOD_PREFIX}{key}")
    }

    /// Serve `request` from cache when possible.
    ///
    /// - fresh cached 200: returned with `hit`, origin untouched
    /// - stale cached 200: returned with `stale`, refresh scheduled
    /// - otherwise: origin response returned with `miss`; a 200 is stored in
    ///   the background
    ///
    /// # Errors
    ///
    /// Returns the origin error on a miss when the origin cannot be reached.
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn fetch(
        &self,
        request: OriginRequest,
        max_age: &MaxAge,
    ) -> Result<SwrResponse, OriginError> {
        let ttl = max_age.resolve(&request);
        let key = request.cache_key();
        let store = &self.inner.store;

        let still_good_key = Self::still_good_key(&key);
        let response_key = Self::response_key(&key);
        let (still_good, cached) =
            tokio::join!(store.get(&still_good_key), store.get(&response_key));

        let fresh = match still_good {
            Ok(marker) => marker.is_some(),
            Err(e) => {
                warn!(error = %e, key = %key, "Failed to read freshness marker");
                false
            }
        };

        if let Some(cached) = decode_cached(&key, cached) {
            if fresh {
                debug!(key = %key, "SWR hit");
                return Ok(SwrResponse::from_cached(cached, CacheStatus::Hit));
            }

            debug!(key = %key, "SWR stale, scheduling refresh");
            self.spawn_refresh(key, request, ttl);
            return Ok(SwrResponse::from_cached(cached, CacheStatus::Stale));
        }

        debug!(key = %key, "SWR miss");
        let response = self.inner.origin.fetch(&request).await?;

        if response.status == 200 {
            let inner = Arc::clone(&self.inner);
            let cached = CachedResponse::from(&response);
            self.inner.tasks.spawn(async move {
                if let Err(e) = inner.write(&key, &cached, ttl).await {
                    warn!(error = %e, key = %key, "Failed to store response");
                }
            });
        }

        Ok(SwrResponse::from_origin(response, CacheStatus::Miss))
    }

    /// Wait until every background write and refresh spawned so far finishes.
    ///
    /// Concurrent callers take turns, so one caller reopening the tracker
    /// cannot leave another waiting on a tracker that never closes. Tasks
    /// spawned while a caller waits are waited for too.
    pub async fn wait_for_background(&self) {
        let _turn = self.inner.draining.lock().await;
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    /// Number of background tasks still running.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Number of keys with a refresh in flight.
    #[must_use]
    pub fn refreshes_in_flight(&self) -> usize {
        self.inner.refreshing.len()
    }

    fn spawn_refresh(&self, key: CacheKey, request: OriginRequest, ttl: Duration) {
        if !self.inner.refreshing.insert(key.clone()) {
            debug!(key = %key, "Refresh already in flight");
            return;
        }

        let guard = RefreshGuard {
            inner: Arc::clone(&self.inner),
            key,
        };
        self.inner.tasks.spawn(async move {
            let inner = &guard.inner;
            let key = &guard.key;

            match inner.origin.fetch(&request).await {
                Ok(response) if response.status == 200 => {
                    if let Err(e) = inner
                        .write(key, &CachedResponse::from(&response), ttl)
                        .await
                    {
                        warn!(error = %e, key = %key, "Failed to store refreshed response");
                    }
                }
                Ok(response) => {
                    debug!(
                        key = %key,
                        status = response.status,
                        "Refresh returned uncacheable status"
                    );
                }
                Err(e) => {
                    warn!(error = %e, key = %key, "Background refresh failed");
                }
            }
        });
    }
}

impl fmt::Debug for SwrCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwrCache")
            .field("pending_tasks", &self.inner.tasks.len())
            .field("refreshing", &self.inner.refreshing.len())
            .finish_non_exhaustive()
    }
}

impl SwrCacheInner {
    /// Persist the body first, then the marker, so a live marker always has a
    /// body behind it.
    async fn write(
        &self,
        key: &CacheKey,
        cached: &CachedResponse,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string(cached).map_err(|e| StoreError::Operation(e.to_string()))?;

        self.store
            .set(&SwrCache::response_key(key), serialized)
            .await?;
        self.store
            .set_with_expiry(&SwrCache::still_good_key(key), "true".to_owned(), ttl)
            .await
    }
}

/// Clears the single-flight entry even if the refresh task panics.
struct RefreshGuard {
    inner: Arc<SwrCacheInner>,
    key: CacheKey,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.inner.refreshing.remove(&self.key);
    }
}

fn decode_cached(
    key: &CacheKey,
    cached: Result<Option<String>, StoreError>,
) -> Option<CachedResponse> {
    let raw = match cached {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, key = %key, "Failed to read cached response");
            return None;
        }
    };

    match serde_json::from_str::<CachedResponse>(&raw) {
        Ok(cached) if cached.status == 200 => Some(cached),
        Ok(cached) => {
            debug!(key = %key, status = cached.status, "Ignoring cached non-200 response");
            None
        }
        Err(e) => {
            warn!(error = %e, key = %key, "Discarding unreadable cached response");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::Method;

    use super::*;
    use crate::swr::{MemoryStore, OriginResponse};

    struct CountingOrigin {
        calls: AtomicUsize,
        status: u16,
    }

    impl CountingOrigin {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Origin for CountingOrigin {
        async fn fetch(&self, _request: &OriginRequest) -> Result<OriginResponse, OriginError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OriginResponse::new(self.status, format!("body-{n}")))
        }
    }

    fn request() -> OriginRequest {
        OriginRequest::new(Method::POST, "https://shop.example/graphql").body("{\"q\":1}")
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let origin = CountingOrigin::new(200);
        let cache = SwrCache::new(Arc::new(MemoryStore::new(100)), origin.clone());
        let max_age = MaxAge::from_secs(60);

        let first = cache.fetch(request(), &max_age).await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        cache.wait_for_background().await;

        let second = cache.fetch(request(), &max_age).await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.body, first.body);
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_not_cached() {
        let origin = CountingOrigin::new(404);
        let cache = SwrCache::new(Arc::new(MemoryStore::new(100)), origin.clone());
        let max_age = MaxAge::from_secs(60);

        for _ in 0..2 {
            let response = cache.fetch(request(), &max_age).await.unwrap();
            assert_eq!(response.cache_status, CacheStatus::Miss);
            assert_eq!(response.status, 404);
            cache.wait_for_background().await;
        }
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_computed_max_age_is_used() {
        let origin = CountingOrigin::new(200);
        let cache = SwrCache::new(Arc::new(MemoryStore::new(100)), origin.clone());
        let max_age = MaxAge::Computed(Arc::new(|_| Duration::ZERO));

        cache.fetch(request(), &max_age).await.unwrap();
        cache.wait_for_background().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let response = cache.fetch(request(), &max_age).await.unwrap();
        assert_eq!(response.cache_status, CacheStatus::Stale);
    }

    #[tokio::test]
    async fn test_concurrent_waits_both_finish() {
        let origin = CountingOrigin::new(200);
        let cache = SwrCache::new(Arc::new(MemoryStore::new(100)), origin.clone());
        let max_age = MaxAge::from_secs(60);

        cache.fetch(request(), &max_age).await.unwrap();

        let waits = async {
            tokio::join!(cache.wait_for_background(), cache.wait_for_background());
        };
        tokio::time::timeout(Duration::from_secs(5), waits)
            .await
            .unwrap();
        assert_eq!(cache.pending_tasks(), 0);

        let response = cache.fetch(request(), &max_age).await.unwrap();
        assert_eq!(response.cache_status, CacheStatus::Hit);
    }

    #[test]
    fn test_max_age_debug_hides_closure() {
        let computed = MaxAge::Computed(Arc::new(|_| Duration::from_secs(1)));
        assert_eq!(format!("{computed:?}"), "Computed(..)");
    }
}
