//! Integration test support for the storefront cache.
//!
//! Stub collaborators that count their calls, so tests can assert how often
//! the caches reached past themselves:
//! - [`StubOrigin`] - scripted provider responses
//! - [`FailingStore`] - a key-value store that is always down
//! - [`StubFetcher`] - source images generated in memory
//! - [`StubCommerce`] - a fixed catalog for router tests
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cache-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use storefront_cache::commerce::{
    CacheMode, CartInfo, Category, CommerceProvider, FullCartItem, FullPage, FullProduct,
    FullWishlistItem, Page, Product, ProductQuery, ProductsPage, ProviderError, SelectedOption,
    SortBy, SortByOption,
};
use storefront_cache::images::{ImageCache, ImageCacheError, SourceFetcher};
use storefront_cache::state::AppState;
use storefront_cache::swr::{
    KeyValueStore, MemoryStore, Origin, OriginError, OriginRequest, OriginResponse, StoreError,
    SwrCache,
};
use storefront_cache_core::{CartItem, Language, ProductId, VariantId, WishlistItem};

// =============================================================================
// Origin
// =============================================================================

/// Scripted origin. Answers every request with the current status and body.
pub struct StubOrigin {
    calls: AtomicUsize,
    reply: Mutex<(u16, Bytes)>,
    delay: Mutex<Duration>,
    fail: Mutex<bool>,
}

impl StubOrigin {
    /// Origin answering `status` with `body`.
    pub fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: Mutex::new((status, Bytes::from(body.to_owned()))),
            delay: Mutex::new(Duration::ZERO),
            fail: Mutex::new(false),
        })
    }

    /// Change what later requests receive.
    pub fn set_reply(&self, status: u16, body: &str) {
        *self.reply.lock().unwrap() = (status, Bytes::from(body.to_owned()));
    }

    /// Wait this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Make later requests fail at the transport level.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// How many requests reached the origin.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Origin for StubOrigin {
    async fn fetch(&self, _request: &OriginRequest) -> Result<OriginResponse, OriginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.fail.lock().unwrap() {
            return Err(OriginError::Unavailable("stub origin down".to_owned()));
        }

        let (status, body) = self.reply.lock().unwrap().clone();
        let mut response = OriginResponse::new(status, body);
        response
            .headers
            .push(("content-type".to_owned(), "application/json".to_owned()));
        Ok(response)
    }
}

// =============================================================================
// Store
// =============================================================================

/// A store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }
}

// =============================================================================
// Image source
// =============================================================================

/// Encode a solid-color PNG of the given size.
pub fn png(width: u32, height: u32) -> Bytes {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    Bytes::from(out.into_inner())
}

/// Source fetcher serving one generated PNG for every `src`.
pub struct StubFetcher {
    calls: AtomicUsize,
    image: Bytes,
}

impl StubFetcher {
    /// Fetcher serving a `width` x `height` PNG.
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            image: png(width, height),
        })
    }

    /// How many sources were fetched.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, _src: &str) -> Result<Bytes, ImageCacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.image.clone())
    }
}

// =============================================================================
// Commerce
// =============================================================================

/// Fixed catalog with one product (`p1`, variants `v1` and `v2`).
#[derive(Default)]
pub struct StubCommerce {
    checkouts: Mutex<Vec<Vec<CartItem>>>,
    fail_checkout: bool,
}

impl StubCommerce {
    /// Catalog whose checkout succeeds.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Catalog whose checkout always fails.
    pub fn with_failing_checkout() -> Arc<Self> {
        Arc::new(Self {
            fail_checkout: true,
            ..Self::default()
        })
    }

    /// Carts that were sent to checkout, in order.
    pub fn checkouts(&self) -> Vec<Vec<CartItem>> {
        self.checkouts.lock().unwrap().clone()
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            default_variant_id: Some(VariantId::new("v1")),
            title: "Linen Shirt".to_owned(),
            formatted_price: "$10.00 USD".to_owned(),
            formatted_options: None,
            image: None,
            slug: "linen-shirt".to_owned(),
            favorited: false,
        }
    }
}

#[async_trait]
impl CommerceProvider for StubCommerce {
    async fn get_categories(
        &self,
        _language: Language,
        _count: u32,
        _mode: CacheMode,
    ) -> Result<Vec<Category>, ProviderError> {
        Ok(vec![Category {
            name: "Shirts".to_owned(),
            slug: "shirts".to_owned(),
        }])
    }

    async fn get_products(
        &self,
        _language: Language,
        _query: &ProductQuery,
    ) -> Result<ProductsPage, ProviderError> {
        Ok(ProductsPage {
            products: vec![Self::product()],
            has_next_page: false,
            next_page_cursor: None,
        })
    }

    async fn get_product(
        &self,
        _language: Language,
        slug: &str,
        selected: &[SelectedOption],
    ) -> Result<Option<FullProduct>, ProviderError> {
        if slug != "linen-shirt" {
            return Ok(None);
        }
        let selected_variant = if selected.iter().any(|o| o.name == "Size" && o.value == "L") {
            "v2"
        } else {
            "v1"
        };
        Ok(Some(FullProduct {
            product: Self::product(),
            description: Some("Breathable.".to_owned()),
            description_html: None,
            images: Vec::new(),
            available_for_sale: true,
            selected_variant_id: Some(VariantId::new(selected_variant)),
            options: Vec::new(),
        }))
    }

    async fn get_featured_products(
        &self,
        _language: Language,
    ) -> Result<Vec<Product>, ProviderError> {
        Ok(vec![Self::product()])
    }

    async fn get_pages(&self, _language: Language) -> Result<Vec<Page>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_page(
        &self,
        _language: Language,
        _slug: &str,
    ) -> Result<Option<FullPage>, ProviderError> {
        Ok(None)
    }

    async fn get_cart_info(
        &self,
        _language: Language,
        items: &[CartItem],
    ) -> Result<Option<CartInfo>, ProviderError> {
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CartInfo {
            formatted_taxes: "Calculated at checkout".to_owned(),
            formatted_total: "Calculated at checkout".to_owned(),
            formatted_shipping: "Calculated at checkout".to_owned(),
            formatted_sub_total: "$10.00 USD".to_owned(),
            items: items
                .iter()
                .map(|item| FullCartItem {
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                    info: Self::product(),
                })
                .collect(),
        }))
    }

    async fn get_wishlist_info(
        &self,
        _language: Language,
        items: &[WishlistItem],
    ) -> Result<Option<Vec<FullWishlistItem>>, ProviderError> {
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            items
                .iter()
                .map(|item| FullWishlistItem {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                    info: Self::product(),
                })
                .collect(),
        ))
    }

    async fn get_checkout_url(
        &self,
        _language: Language,
        items: &[CartItem],
    ) -> Result<String, ProviderError> {
        if self.fail_checkout {
            return Err(ProviderError::Status(500));
        }
        self.checkouts.lock().unwrap().push(items.to_vec());
        Ok("https://checkout.example.test/c/1".to_owned())
    }

    fn get_sort_by_options(&self, _language: Language) -> Vec<SortByOption> {
        SortBy::ALL.into_iter().map(SortByOption::from).collect()
    }
}

// =============================================================================
// State
// =============================================================================

/// State over stub collaborators. The image cache writes under `image_dir`.
pub fn test_state(commerce: Arc<dyn CommerceProvider>, image_dir: &std::path::Path) -> AppState {
    let swr = SwrCache::new(
        Arc::new(MemoryStore::new(1_000)),
        StubOrigin::new(200, "{}"),
    );
    let images = ImageCache::new(image_dir, StubFetcher::new(8, 8));
    AppState::from_parts(commerce, swr, images)
}
