//! Product listing and search.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{CacheMode, Category, ProductQuery, ProductsPage, SortBy, SortByOption};
use crate::error::Result;
use crate::models::{load_language, load_shopping};
use crate::routes::{CATEGORY_COUNT, mark_favorites, non_empty};
use crate::state::AppState;

/// Query parameters for `/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub cursor: Option<String>,
    /// Present (any value) to bypass the response cache.
    pub nocache: Option<String>,
}

impl SearchParams {
    fn cache_mode(&self) -> CacheMode {
        if self.nocache.is_some() {
            CacheMode::Bypass
        } else {
            CacheMode::Cached
        }
    }

    fn into_query(self) -> ProductQuery {
        let mode = self.cache_mode();
        ProductQuery {
            category: non_empty(self.category),
            sort: self.sort.as_deref().and_then(SortBy::parse),
            search: non_empty(self.q),
            cursor: non_empty(self.cursor),
            mode,
            ..ProductQuery::default()
        }
    }
}

/// Listing view model.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub categories: Vec<Category>,
    pub sort_by_options: Vec<SortByOption>,
    pub products: ProductsPage,
    pub cart_count: u64,
}

/// One page of products, filtered by category or search term.
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchView>> {
    let language = load_language(&session).await;
    let shopping = load_shopping(&session).await?;
    let commerce = state.commerce();

    let mode = params.cache_mode();
    let query = params.into_query();

    let (categories, mut products) = tokio::try_join!(
        commerce.get_categories(language, CATEGORY_COUNT, mode),
        commerce.get_products(language, &query),
    )?;
    mark_favorites(&mut products.products, &shopping.wishlist);

    Ok(Json(SearchView {
        categories,
        sort_by_options: commerce.get_sort_by_options(language),
        products,
        cart_count: shopping.cart_count(),
    }))
}
