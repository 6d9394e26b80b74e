//! Shopify Storefront API provider.
//!
//! Queries are plain GraphQL documents posted as JSON. Reads that may be
//! cached go through [`SwrCache`]; everything else goes straight to the
//! [`Origin`].

mod convert;
pub(crate) mod data;
mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use storefront_cache_core::{CartItem, Language, WishlistItem};
use tracing::{debug, error, instrument};

use super::{
    CacheMode, CartInfo, Category, CommerceProvider, FullPage, FullProduct, FullWishlistItem,
    Page, Product, ProductQuery, ProductsPage, ProviderError, SelectedOption, SortBy,
    SortByOption,
};
use crate::config::ShopifyConfig;
use crate::swr::{MaxAge, Origin, OriginRequest, SwrCache};

pub use convert::format_price;
use convert::{
    convert_cart_info, convert_product_card, convert_product_connection,
    convert_product_detail, convert_wishlist_info,
};
use data::{
    CartCreateData, CollectionProductsData, CollectionsData, GraphQLResponse, NodesData,
    PagesData, ProductData, ProductsData,
};

/// Number of products on the home page.
const FEATURED_PRODUCT_COUNT: u32 = 12;

// =============================================================================
// ShopifyProvider
// =============================================================================

/// [`CommerceProvider`] backed by the Shopify Storefront API.
#[derive(Clone)]
pub struct ShopifyProvider {
    inner: Arc<ShopifyProviderInner>,
}

struct ShopifyProviderInner {
    endpoint: String,
    access_token: SecretString,
    cache: SwrCache,
    origin: Arc<dyn Origin>,
    max_age: MaxAge,
}

impl ShopifyProvider {
    /// Create a provider.
    ///
    /// `origin` serves uncached requests and should be the same transport
    /// the cache was built with.
    #[must_use]
    pub fn new(
        config: &ShopifyConfig,
        cache: SwrCache,
        origin: Arc<dyn Origin>,
        max_age: MaxAge,
    ) -> Self {
        Self {
            inner: Arc::new(ShopifyProviderInner {
                endpoint: config.endpoint(),
                access_token: config.storefront_access_token.clone(),
                cache,
                origin,
                max_age,
            }),
        }
    }

    /// Build the POST request for a GraphQL document.
    fn request(
        &self,
        language: Language,
        query: &str,
        variables: Value,
    ) -> Result<OriginRequest, ProviderError> {
        let body = serde_json::to_vec(&json!({ "query": query, "variables": variables }))?;

        Ok(OriginRequest::new(Method::POST, self.inner.endpoint.as_str())
            .header("Accept-Language", language.as_str())
            .header("Content-Type", "application/json")
            .header(
                "X-Shopify-Storefront-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .body(body))
    }

    /// Execute a GraphQL document and decode its `data`.
    async fn query<T: DeserializeOwned>(
        &self,
        language: Language,
        query: &str,
        variables: Value,
        mode: CacheMode,
    ) -> Result<T, ProviderError> {
        let request = self.request(language, query, variables)?;

        let (status, body) = match mode {
            CacheMode::Cached => {
                let response = self.inner.cache.fetch(request, &self.inner.max_age).await?;
                debug!(cache = %response.cache_status, "Provider response");
                (response.status, response.body)
            }
            CacheMode::Bypass => {
                let response = self.inner.origin.fetch(&request).await?;
                (response.status, response.body)
            }
        };

        if !(200..300).contains(&status) {
            error!(
                status,
                body = %String::from_utf8_lossy(&body).chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ProviderError::Status(status));
        }

        let response: GraphQLResponse<T> = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Failed to parse Shopify GraphQL response");
            ProviderError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ProviderError::GraphQL(errors));
        }

        response.data.ok_or(ProviderError::MissingData("data"))
    }

    async fn lookup_variants(
        &self,
        language: Language,
        ids: Vec<&str>,
    ) -> Result<NodesData, ProviderError> {
        self.query(
            language,
            queries::GET_PRODUCT_VARIANTS,
            json!({ "ids": ids }),
            CacheMode::Bypass,
        )
        .await
    }
}

impl std::fmt::Debug for ShopifyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyProvider")
            .field("endpoint", &self.inner.endpoint)
            .field("max_age", &self.inner.max_age)
            .finish_non_exhaustive()
    }
}

/// Variables for a product listing query.
///
/// Absent values are left out so the document defaults apply. A search
/// replaces the category filter.
fn product_list_variables(query: &ProductQuery) -> (bool, Value) {
    let mut vars = Map::new();
    vars.insert("first".to_owned(), json!(query.per_page));

    let search = query.search.as_deref().filter(|s| !s.is_empty());
    let category = if search.is_some() {
        None
    } else {
        query.category.as_deref().filter(|c| !c.is_empty())
    };

    let q = search.map_or_else(String::new, |s| {
        format!("product_type:{s} OR title:{s} OR tag:{s} ")
    });
    vars.insert("query".to_owned(), json!(q));

    if let Some(sort) = query.sort {
        let (sort_key, reverse) = match sort {
            SortBy::PriceAsc => ("PRICE", false),
            SortBy::PriceDesc => ("PRICE", true),
            SortBy::Trending => ("BEST_SELLING", false),
            SortBy::Latest if category.is_some() => ("CREATED", true),
            SortBy::Latest => ("CREATED_AT", true),
        };
        vars.insert("sortKey".to_owned(), json!(sort_key));
        vars.insert("reverse".to_owned(), json!(reverse));
    }

    if let Some(category) = category {
        vars.insert("collection".to_owned(), json!(category));
    }
    if let Some(cursor) = &query.cursor {
        vars.insert("cursor".to_owned(), json!(cursor));
    }

    (category.is_some(), Value::Object(vars))
}

#[async_trait]
impl CommerceProvider for ShopifyProvider {
    #[instrument(skip(self))]
    async fn get_categories(
        &self,
        language: Language,
        count: u32,
        mode: CacheMode,
    ) -> Result<Vec<Category>, ProviderError> {
        let data: CollectionsData = self
            .query(
                language,
                queries::GET_ALL_COLLECTIONS,
                json!({ "first": count }),
                mode,
            )
            .await?;

        Ok(data
            .collections
            .into_nodes()
            .map(|node| Category {
                name: node.title,
                slug: node.handle,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_products(
        &self,
        language: Language,
        query: &ProductQuery,
    ) -> Result<ProductsPage, ProviderError> {
        let (in_collection, variables) = product_list_variables(query);

        if in_collection {
            let data: CollectionProductsData = self
                .query(
                    language,
                    queries::GET_COLLECTION_PRODUCTS,
                    variables,
                    query.mode,
                )
                .await?;

            return Ok(data
                .collections
                .into_nodes()
                .next()
                .map(|collection| convert_product_connection(collection.products))
                .unwrap_or_default());
        }

        let data: ProductsData = self
            .query(language, queries::GET_ALL_PRODUCTS, variables, query.mode)
            .await?;
        Ok(convert_product_connection(data.products))
    }

    #[instrument(skip(self, selected))]
    async fn get_product(
        &self,
        language: Language,
        slug: &str,
        selected: &[SelectedOption],
    ) -> Result<Option<FullProduct>, ProviderError> {
        let data: ProductData = self
            .query(
                language,
                queries::GET_PRODUCT,
                json!({ "slug": slug }),
                CacheMode::Cached,
            )
            .await?;

        Ok(data
            .product_by_handle
            .map(|detail| convert_product_detail(detail, selected)))
    }

    #[instrument(skip(self))]
    async fn get_featured_products(
        &self,
        language: Language,
    ) -> Result<Vec<Product>, ProviderError> {
        let data: ProductsData = self
            .query(
                language,
                queries::GET_ALL_PRODUCTS,
                json!({ "first": FEATURED_PRODUCT_COUNT }),
                CacheMode::Cached,
            )
            .await?;

        Ok(data
            .products
            .edges
            .into_iter()
            .map(|edge| convert_product_card(edge.node))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_pages(&self, language: Language) -> Result<Vec<Page>, ProviderError> {
        let data: PagesData = self
            .query(language, queries::GET_ALL_PAGES, json!({}), CacheMode::Cached)
            .await?;

        Ok(data
            .pages
            .into_nodes()
            .map(|node| Page {
                id: node.id,
                slug: node.handle,
                title: node.title,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_page(
        &self,
        language: Language,
        slug: &str,
    ) -> Result<Option<FullPage>, ProviderError> {
        let data: PagesData = self
            .query(
                language,
                queries::GET_PAGE,
                json!({ "query": format!("handle:{slug}") }),
                CacheMode::Cached,
            )
            .await?;

        Ok(data.pages.into_nodes().next().map(|node| FullPage {
            page: Page {
                id: node.id,
                slug: node.handle,
                title: node.title,
            },
            body: node.body.unwrap_or_default(),
            summary: node.body_summary.unwrap_or_default(),
        }))
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn get_cart_info(
        &self,
        language: Language,
        items: &[CartItem],
    ) -> Result<Option<CartInfo>, ProviderError> {
        if items.is_empty() {
            return Ok(None);
        }

        let ids = items.iter().map(|item| item.variant_id.as_str()).collect();
        let data = self.lookup_variants(language, ids).await?;
        Ok(convert_cart_info(&data.nodes, items)?)
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn get_wishlist_info(
        &self,
        language: Language,
        items: &[WishlistItem],
    ) -> Result<Option<Vec<FullWishlistItem>>, ProviderError> {
        if items.is_empty() {
            return Ok(None);
        }

        let ids = items.iter().map(|item| item.variant_id.as_str()).collect();
        let data = self.lookup_variants(language, ids).await?;
        Ok(convert_wishlist_info(&data.nodes, items))
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn get_checkout_url(
        &self,
        language: Language,
        items: &[CartItem],
    ) -> Result<String, ProviderError> {
        let line_items: Vec<Value> = items
            .iter()
            .map(|item| {
                json!({
                    "quantity": item.quantity.get(),
                    "merchandiseId": item.variant_id.as_str(),
                })
            })
            .collect();

        let data: CartCreateData = self
            .query(
                language,
                queries::CREATE_CHECKOUT_URL,
                json!({ "lineItems": line_items }),
                CacheMode::Bypass,
            )
            .await?;

        data.cart_create
            .and_then(|payload| payload.cart)
            .map(|cart| cart.checkout_url)
            .ok_or(ProviderError::MissingData("cartCreate.cart.checkoutUrl"))
    }

    fn get_sort_by_options(&self, _language: Language) -> Vec<SortByOption> {
        SortBy::ALL.into_iter().map(SortByOption::from).collect()
    }
}
