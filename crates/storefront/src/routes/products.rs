//! Product detail and add-to-cart.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use storefront_cache_core::line_item;
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::commerce::{FullProduct, SelectedOption};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{load_language, load_shopping, save_shopping};
use crate::routes::cart::variant_field;
use crate::routes::{mark_favorites, validate_redirect};
use crate::state::AppState;

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub variant_id: Option<String>,
    pub redirect: Option<String>,
}

/// Display a product. Query parameters select option values, e.g.
/// `?Size=M&Color=Red`.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Query(options): Query<Vec<(String, String)>>,
) -> Result<Json<FullProduct>> {
    let language = load_language(&session).await;
    let shopping = load_shopping(&session).await?;

    let selected: Vec<SelectedOption> = options
        .into_iter()
        .map(|(name, value)| SelectedOption::new(name, value))
        .collect();

    let mut product = state
        .commerce()
        .get_product(language, &slug, &selected)
        .await?
        .ok_or(AppError::NotFound(slug))?;
    mark_favorites(std::slice::from_mut(&mut product.product), &shopping.wishlist);

    Ok(Json(product))
}

/// Add one unit of a variant to the cart.
///
/// Without a `variantId` the cart is left alone; the shopper is redirected
/// either way.
#[instrument(skip(session))]
pub async fn add_to_cart(
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let fallback = format!("/product/{slug}");
    let redirect_to = validate_redirect(form.redirect.as_deref(), &fallback);

    let Some(variant_id) = variant_field(form.variant_id.as_deref()) else {
        debug!("Add to cart without a variant");
        return Ok(Redirect::to(&redirect_to));
    };

    let mut shopping = load_shopping(&session).await?;
    shopping.cart = line_item::add_to_cart(shopping.cart, &variant_id, 1);
    save_shopping(&session, &shopping).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("variant_id", variant_id.as_str())]),
    );

    Ok(Redirect::to(&redirect_to))
}
