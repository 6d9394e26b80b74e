//! HTTP route handlers for storefront.
//!
//! Handlers answer with JSON view models; rendering is left to whatever sits
//! in front of this service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Featured products, categories, pages
//! GET  /health                 - Health check
//! GET  /api/image              - Image transform cache
//!
//! # Catalog
//! GET  /search                 - Product listing (?q, category, sort, cursor, nocache)
//! GET  /product/{slug}         - Product detail (query params select options)
//! POST /product/{slug}         - Add one of a variant to the cart
//! GET  /page/{slug}            - Content page
//!
//! # Cart and wishlist
//! GET  /cart                   - Priced cart
//! POST /cart                   - _action=set-quantity|delete
//! GET  /wishlist               - Priced wishlist
//! POST /wishlist               - _action=add|set-quantity|delete|move-to-cart
//!
//! # Actions
//! POST /actions/checkout       - Redirect to provider checkout
//! POST /actions/set-language   - Store the shopper's language
//! ```
//!
//! Every mutation answers `303 See Other` to a validated redirect target.

pub mod actions;
pub mod cart;
pub mod health;
pub mod home;
pub mod image;
pub mod pages;
pub mod products;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};
use storefront_cache_core::WishlistItem;

use crate::commerce::Product;
use crate::images::IMAGE_ROUTE;
use crate::state::AppState;

/// How many categories listing pages ask for.
pub const CATEGORY_COUNT: u32 = 250;

/// Create the action routes router.
pub fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(actions::checkout))
        .route("/set-language", post(actions::set_language))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route(IMAGE_ROUTE, get(image::image))
        .route("/search", get(search::search))
        .route(
            "/product/{slug}",
            get(products::show).post(products::add_to_cart),
        )
        .route("/page/{slug}", get(pages::show))
        .route("/cart", get(cart::show).post(cart::update))
        .route("/wishlist", get(wishlist::show).post(wishlist::update))
        .nest("/actions", action_routes())
}

/// Pick a safe post-mutation redirect.
///
/// Only same-site paths are accepted: the target must start with `/` and
/// must not start with `//` or `/\`, which browsers resolve to another host.
#[must_use]
pub fn validate_redirect(target: Option<&str>, default: &str) -> String {
    match target {
        Some(target)
            if target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\") =>
        {
            target.to_owned()
        }
        _ => default.to_owned(),
    }
}

/// Flag products that are on the shopper's wishlist.
pub(crate) fn mark_favorites(products: &mut [Product], wishlist: &[WishlistItem]) {
    for product in products {
        product.favorited = wishlist.iter().any(|item| item.product_id == product.id);
    }
}

/// Treat empty form and query values as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use storefront_cache_core::{ProductId, Quantity, VariantId};

    use super::*;

    #[test]
    fn test_validate_redirect() {
        assert_eq!(validate_redirect(Some("/cart"), "/"), "/cart");
        assert_eq!(validate_redirect(Some("/search?q=hat"), "/"), "/search?q=hat");
        assert_eq!(validate_redirect(Some("//evil.example"), "/"), "/");
        assert_eq!(validate_redirect(Some("/\\evil.example"), "/"), "/");
        assert_eq!(validate_redirect(Some("https://evil.example"), "/cart"), "/cart");
        assert_eq!(validate_redirect(Some(""), "/wishlist"), "/wishlist");
        assert_eq!(validate_redirect(None, "/wishlist"), "/wishlist");
    }

    #[test]
    fn test_mark_favorites() {
        let product = |id: &str| Product {
            id: ProductId::new(id),
            default_variant_id: None,
            title: id.to_owned(),
            formatted_price: "$1.00 USD".to_owned(),
            formatted_options: None,
            image: None,
            slug: id.to_owned(),
            favorited: false,
        };
        let mut products = vec![product("p1"), product("p2")];
        let wishlist = vec![WishlistItem::new(
            ProductId::new("p2"),
            VariantId::new("v2"),
            Quantity::ONE,
        )];

        mark_favorites(&mut products, &wishlist);

        assert!(!products[0].favorited);
        assert!(products[1].favorited);
    }
}
