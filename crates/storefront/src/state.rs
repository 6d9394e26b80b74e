//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::commerce::{CommerceProvider, ShopifyProvider};
use crate::config::StorefrontConfig;
use crate::images::{DefaultSourceFetcher, ImageCache};
use crate::swr::{HttpOrigin, MaxAge, MemoryStore, Origin, SwrCache};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the caches and the commerce provider.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    commerce: Arc<dyn CommerceProvider>,
    swr: SwrCache,
    images: ImageCache,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the production state from configuration.
    ///
    /// Wires the in-memory store and HTTP origin into the SWR cache, puts the
    /// Shopify provider on top of it, and points the image cache at the
    /// configured directories.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig) -> Result<Self, StateError> {
        let client = reqwest::Client::builder().build()?;
        let origin: Arc<dyn Origin> = Arc::new(HttpOrigin::new(client));
        let store = Arc::new(MemoryStore::new(config.swr.max_entries));
        let swr = SwrCache::new(store, Arc::clone(&origin));

        let commerce = ShopifyProvider::new(
            &config.shopify,
            swr.clone(),
            origin,
            MaxAge::Fixed(config.swr.max_age),
        );

        if config.images.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for image sources");
        }
        let image_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.images.accept_invalid_certs)
            .build()?;
        let fetcher = DefaultSourceFetcher::new(config.images.public_dir.clone(), image_client);
        let images = ImageCache::new(config.images.cache_dir.clone(), Arc::new(fetcher));

        Ok(Self::from_parts(Arc::new(commerce), swr, images))
    }

    /// Assemble state from already-built components.
    #[must_use]
    pub fn from_parts(
        commerce: Arc<dyn CommerceProvider>,
        swr: SwrCache,
        images: ImageCache,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                commerce,
                swr,
                images,
                started_at: Utc::now(),
            }),
        }
    }

    /// Get the commerce provider.
    #[must_use]
    pub fn commerce(&self) -> &dyn CommerceProvider {
        self.inner.commerce.as_ref()
    }

    /// Get the provider response cache.
    #[must_use]
    pub fn swr(&self) -> &SwrCache {
        &self.inner.swr
    }

    /// Get the image transform cache.
    #[must_use]
    pub fn images(&self) -> &ImageCache {
        &self.inner.images
    }

    /// When this state was created.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}
