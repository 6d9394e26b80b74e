//! Commerce backend abstraction.
//!
//! # Architecture
//!
//! - [`CommerceProvider`] - what routes need from a commerce backend
//! - [`ShopifyProvider`] - Shopify Storefront API implementation
//!
//! Catalog reads (categories, products, pages) go through the SWR cache.
//! Cart and wishlist lookups and checkout creation always hit the backend.

mod error;
pub mod shopify;
mod types;

use async_trait::async_trait;
use storefront_cache_core::{CartItem, Language, WishlistItem};

pub use error::{GraphQLError, GraphQLErrorLocation, ProviderError};
pub use shopify::ShopifyProvider;
pub use types::*;

/// Operations the storefront needs from a commerce backend.
#[async_trait]
pub trait CommerceProvider: Send + Sync + 'static {
    /// First `count` categories.
    async fn get_categories(
        &self,
        language: Language,
        count: u32,
        mode: CacheMode,
    ) -> Result<Vec<Category>, ProviderError>;

    /// One page of a product listing.
    async fn get_products(
        &self,
        language: Language,
        query: &ProductQuery,
    ) -> Result<ProductsPage, ProviderError>;

    /// Product detail. `selected` picks the variant; unknown option names are
    /// ignored. `Ok(None)` when no product has this slug.
    async fn get_product(
        &self,
        language: Language,
        slug: &str,
        selected: &[SelectedOption],
    ) -> Result<Option<FullProduct>, ProviderError>;

    /// Products for the home page.
    async fn get_featured_products(&self, language: Language)
    -> Result<Vec<Product>, ProviderError>;

    /// Content pages for navigation.
    async fn get_pages(&self, language: Language) -> Result<Vec<Page>, ProviderError>;

    /// One content page. `Ok(None)` when no page has this slug.
    async fn get_page(&self, language: Language, slug: &str)
    -> Result<Option<FullPage>, ProviderError>;

    /// Priced cart lines. `Ok(None)` when nothing in `items` resolves.
    async fn get_cart_info(
        &self,
        language: Language,
        items: &[CartItem],
    ) -> Result<Option<CartInfo>, ProviderError>;

    /// Priced wishlist lines. `Ok(None)` when nothing in `items` resolves.
    async fn get_wishlist_info(
        &self,
        language: Language,
        items: &[WishlistItem],
    ) -> Result<Option<Vec<FullWishlistItem>>, ProviderError>;

    /// Create a checkout for `items` and return where to send the shopper.
    async fn get_checkout_url(
        &self,
        language: Language,
        items: &[CartItem],
    ) -> Result<String, ProviderError>;

    /// Sort choices for product listings.
    fn get_sort_by_options(&self, language: Language) -> Vec<SortByOption>;
}
