//! Home page.

use axum::{Json, extract::State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{CacheMode, Category, Page, Product};
use crate::error::Result;
use crate::models::{load_language, load_shopping};
use crate::routes::{CATEGORY_COUNT, mark_favorites};
use crate::state::AppState;

/// Home page view model.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub featured_products: Vec<Product>,
    pub categories: Vec<Category>,
    pub pages: Vec<Page>,
    pub cart_count: u64,
}

/// Featured products plus navigation data.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> Result<Json<HomeView>> {
    let language = load_language(&session).await;
    let shopping = load_shopping(&session).await?;
    let commerce = state.commerce();

    let (mut featured_products, categories, pages) = tokio::try_join!(
        commerce.get_featured_products(language),
        commerce.get_categories(language, CATEGORY_COUNT, CacheMode::Cached),
        commerce.get_pages(language),
    )?;
    mark_favorites(&mut featured_products, &shopping.wishlist);

    Ok(Json(HomeView {
        featured_products,
        categories,
        pages,
        cart_count: shopping.cart_count(),
    }))
}
