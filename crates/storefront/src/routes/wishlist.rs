//! Wishlist route handlers.

use axum::{Form, Json, extract::State, response::Redirect};
use serde::{Deserialize, Serialize};
use storefront_cache_core::{ProductId, ShoppingSession, line_item};
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::commerce::FullWishlistItem;
use crate::error::{Result, add_breadcrumb};
use crate::models::{load_language, load_shopping, save_shopping};
use crate::routes::cart::{quantity_field, variant_field};
use crate::routes::{non_empty, validate_redirect};
use crate::state::AppState;

/// Wishlist view model.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistView {
    pub wishlist: Option<Vec<FullWishlistItem>>,
    pub cart_count: u64,
}

/// Wishlist mutation form data. Incomplete forms change nothing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistActionForm {
    #[serde(rename = "_action")]
    pub action: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub quantity: Option<String>,
    pub redirect: Option<String>,
}

fn product_field(value: Option<&str>) -> Option<ProductId> {
    non_empty(value.map(str::to_owned)).map(ProductId::new)
}

/// Display the priced wishlist.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<WishlistView>> {
    let language = load_language(&session).await;
    let shopping = load_shopping(&session).await?;

    let wishlist = state
        .commerce()
        .get_wishlist_info(language, &shopping.wishlist)
        .await?;

    Ok(Json(WishlistView {
        wishlist,
        cart_count: shopping.cart_count(),
    }))
}

/// Apply a wishlist mutation and redirect.
///
/// A missing field or an unknown `_action` skips the mutation, as does
/// `move-to-cart` for a variant that is not on the wishlist.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<WishlistActionForm>) -> Result<Redirect> {
    let mut shopping = load_shopping(&session).await?;

    if apply(&mut shopping, &form).is_some() {
        save_shopping(&session, &shopping).await?;
    } else {
        debug!(action = ?form.action, "Wishlist action skipped");
    }

    Ok(Redirect::to(&validate_redirect(
        form.redirect.as_deref(),
        "/wishlist",
    )))
}

/// `None` when nothing changed.
fn apply(shopping: &mut ShoppingSession, form: &WishlistActionForm) -> Option<()> {
    let variant_id = variant_field(form.variant_id.as_deref())?;

    match form.action.as_deref()? {
        "add" => {
            let product_id = product_field(form.product_id.as_deref())?;
            let wishlist = std::mem::take(&mut shopping.wishlist);
            shopping.wishlist = line_item::add_to_wishlist(wishlist, &product_id, &variant_id, 1);
            add_breadcrumb(
                "wishlist",
                "Added to wishlist",
                Some(&[("variant_id", variant_id.as_str())]),
            );
        }
        "set-quantity" => {
            let product_id = product_field(form.product_id.as_deref())?;
            let quantity = quantity_field(form.quantity.as_deref())?;
            let wishlist = std::mem::take(&mut shopping.wishlist);
            shopping.wishlist =
                line_item::update_wishlist_item(wishlist, &product_id, &variant_id, quantity);
        }
        "delete" => {
            let wishlist = std::mem::take(&mut shopping.wishlist);
            shopping.wishlist = line_item::remove_wishlist_item(wishlist, &variant_id);
        }
        "move-to-cart" => {
            *shopping = shopping.clone().move_to_cart(&variant_id)?;
            add_breadcrumb(
                "wishlist",
                "Moved to cart",
                Some(&[("variant_id", variant_id.as_str())]),
            );
        }
        _ => return None,
    }

    Some(())
}
