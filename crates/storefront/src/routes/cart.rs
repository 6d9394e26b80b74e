//! Cart route handlers.
//!
//! The cart lives in the session as variant IDs and quantities; prices and
//! product details are looked up from the commerce provider on every view.

use axum::{Form, Json, extract::State, response::Redirect};
use serde::{Deserialize, Serialize};
use storefront_cache_core::{ShoppingSession, VariantId, line_item};
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::commerce::CartInfo;
use crate::error::{Result, add_breadcrumb};
use crate::models::{load_language, load_shopping, save_shopping};
use crate::routes::validate_redirect;
use crate::state::AppState;

/// Cart view model. `cart` is `None` when the cart is empty or nothing in it
/// resolves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart: Option<CartInfo>,
    pub cart_count: u64,
}

/// Cart mutation form data.
///
/// Every field is optional: an incomplete form leaves the cart alone but still
/// redirects.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartActionForm {
    #[serde(rename = "_action")]
    pub action: Option<String>,
    pub variant_id: Option<String>,
    pub quantity: Option<String>,
    pub redirect: Option<String>,
}

/// Non-blank variant ID field.
pub(crate) fn variant_field(value: Option<&str>) -> Option<VariantId> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(VariantId::new)
}

/// Integer quantity field. Range is left to the reducers.
pub(crate) fn quantity_field(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

/// Display the priced cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let language = load_language(&session).await;
    let shopping = load_shopping(&session).await?;

    let cart = state
        .commerce()
        .get_cart_info(language, &shopping.cart)
        .await?;

    Ok(Json(CartView {
        cart,
        cart_count: shopping.cart_count(),
    }))
}

/// Apply a cart mutation and redirect.
///
/// A missing field or an unknown `_action` skips the mutation.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<CartActionForm>) -> Result<Redirect> {
    let mut shopping = load_shopping(&session).await?;

    if apply(&mut shopping, &form).is_some() {
        save_shopping(&session, &shopping).await?;
    } else {
        debug!(action = ?form.action, "Cart action skipped");
    }

    Ok(Redirect::to(&validate_redirect(
        form.redirect.as_deref(),
        "/cart",
    )))
}

/// `None` when the form was incomplete and nothing changed.
fn apply(shopping: &mut ShoppingSession, form: &CartActionForm) -> Option<()> {
    let variant_id = variant_field(form.variant_id.as_deref())?;

    match form.action.as_deref()? {
        "set-quantity" => {
            let quantity = quantity_field(form.quantity.as_deref())?;
            let cart = std::mem::take(&mut shopping.cart);
            shopping.cart = line_item::update_cart_item(cart, &variant_id, quantity);
        }
        "delete" => {
            let cart = std::mem::take(&mut shopping.cart);
            shopping.cart = line_item::remove_cart_item(cart, &variant_id);
            add_breadcrumb(
                "cart",
                "Removed from cart",
                Some(&[("variant_id", variant_id.as_str())]),
            );
        }
        _ => return None,
    }

    Some(())
}
