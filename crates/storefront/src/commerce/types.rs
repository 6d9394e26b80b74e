//! View types returned by a [`CommerceProvider`](super::CommerceProvider).
//!
//! Serialized camelCase so route handlers can return them as JSON directly.

use serde::{Deserialize, Serialize};
use storefront_cache_core::{ProductId, Quantity, VariantId};

// =============================================================================
// Catalog
// =============================================================================

/// A product category (Shopify collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub slug: String,
}

/// A product as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub default_variant_id: Option<VariantId>,
    pub title: String,
    pub formatted_price: String,
    /// Selected variant title, set for cart and wishlist lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_options: Option<String>,
    pub image: Option<String>,
    pub slug: String,
    /// Whether the product is on the current shopper's wishlist.
    #[serde(default)]
    pub favorited: bool,
}

/// A product option and its possible values (e.g. `Size: S, M, L`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

/// One chosen option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

impl SelectedOption {
    /// Create a selected option.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProduct {
    #[serde(flatten)]
    pub product: Product,
    pub description: Option<String>,
    pub description_html: Option<String>,
    pub images: Vec<String>,
    pub available_for_sale: bool,
    pub selected_variant_id: Option<VariantId>,
    pub options: Vec<ProductOption>,
}

/// One page of a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub has_next_page: bool,
    pub next_page_cursor: Option<String>,
}

/// Whether a read may be answered from the SWR cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    #[default]
    Cached,
    /// Go straight to the backend (`?nocache` on listing pages).
    Bypass,
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Trending,
    Latest,
    PriceAsc,
    PriceDesc,
}

impl SortBy {
    /// All sort orders in display order.
    pub const ALL: [Self; 4] = [Self::Trending, Self::Latest, Self::PriceAsc, Self::PriceDesc];

    /// Parse a `sort` query value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trending-desc" => Some(Self::Trending),
            "latest-desc" => Some(Self::Latest),
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            _ => None,
        }
    }

    /// Query value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending-desc",
            Self::Latest => "latest-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trending => "Trending",
            Self::Latest => "Latest arrivals",
            Self::PriceAsc => "Price: Low to high",
            Self::PriceDesc => "Price: High to low",
        }
    }
}

/// A sort choice offered to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortByOption {
    pub label: String,
    pub value: String,
}

impl From<SortBy> for SortByOption {
    fn from(sort: SortBy) -> Self {
        Self {
            label: sort.label().to_owned(),
            value: sort.as_str().to_owned(),
        }
    }
}

/// Parameters for [`get_products`](super::CommerceProvider::get_products).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Category slug. Ignored when `search` is set.
    pub category: Option<String>,
    pub sort: Option<SortBy>,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub per_page: u32,
    pub mode: CacheMode,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            sort: None,
            search: None,
            cursor: None,
            per_page: 30,
            mode: CacheMode::Cached,
        }
    }
}

// =============================================================================
// Content
// =============================================================================

/// A content page as listed in navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub slug: String,
    pub title: String,
}

/// A content page with its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullPage {
    #[serde(flatten)]
    pub page: Page,
    pub body: String,
    pub summary: String,
}

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// Shown for shipping and taxes until checkout computes them.
pub const CALCULATED_AT_CHECKOUT: &str = "Calculated at checkout";

/// A cart line with its product details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCartItem {
    pub variant_id: VariantId,
    pub quantity: Quantity,
    pub info: Product,
}

/// A priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInfo {
    pub formatted_taxes: String,
    pub formatted_total: String,
    pub formatted_shipping: String,
    pub formatted_sub_total: String,
    pub items: Vec<FullCartItem>,
}

/// A wishlist line with its product details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullWishlistItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: Quantity,
    pub info: Product,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_round_trips_through_query_value() {
        for sort in SortBy::ALL {
            assert_eq!(SortBy::parse(sort.as_str()), Some(sort));
        }
        assert_eq!(SortBy::parse("relevance"), None);
    }

    #[test]
    fn test_default_query_page_size() {
        assert_eq!(ProductQuery::default().per_page, 30);
    }
}
