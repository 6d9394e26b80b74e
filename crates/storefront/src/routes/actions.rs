//! Checkout and language actions.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use storefront_cache_core::Language;
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{load_language, load_shopping, save_language};
use crate::routes::validate_redirect;
use crate::state::AppState;

/// Language form data.
#[derive(Debug, Deserialize)]
pub struct SetLanguageForm {
    pub lang: Option<String>,
    pub redirect: Option<String>,
}

/// Hand the cart to the provider's checkout.
///
/// Any failure, including an empty cart, sends the shopper back to `/cart`.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Redirect {
    let language = load_language(&session).await;
    let shopping = match load_shopping(&session).await {
        Ok(shopping) => shopping,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart from session");
            return Redirect::to("/cart");
        }
    };

    if shopping.cart.is_empty() {
        return Redirect::to("/cart");
    }

    match state
        .commerce()
        .get_checkout_url(language, &shopping.cart)
        .await
    {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create checkout");
            Redirect::to("/cart")
        }
    }
}

/// Store the shopper's language.
///
/// A missing or unsupported `lang` keeps the current language; the shopper is
/// redirected either way.
#[instrument(skip(session))]
pub async fn set_language(
    session: Session,
    Form(form): Form<SetLanguageForm>,
) -> Result<Redirect> {
    match form.lang.as_deref().map(str::trim).and_then(Language::parse) {
        Some(language) => save_language(&session, language).await?,
        None => debug!(lang = ?form.lang, "Unsupported language"),
    }

    Ok(Redirect::to(&validate_redirect(form.redirect.as_deref(), "/")))
}
