//! Session-backed cart, wishlist, and checkout routes.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use serde_json::Value;
use storefront_cache::commerce::CommerceProvider;
use storefront_cache_integration_tests::{StubCommerce, test_state};
use tower::ServiceExt;

/// Router plus the session cookie it handed out.
struct Shopper {
    app: Router,
    cookie: Option<String>,
    _images: tempfile::TempDir,
}

impl Shopper {
    fn new(commerce: Arc<dyn CommerceProvider>) -> Self {
        let images = tempfile::tempdir().unwrap();
        let app = storefront_cache::app(test_state(commerce, images.path()), false);
        Self {
            app,
            cookie: None,
            _images: images,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }
        response
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_owned()))
            .unwrap();
        self.send(request).await
    }

    async fn get_json(&mut self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_add_to_cart_accumulates() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let response = shopper
        .post("/product/linen-shirt", "variantId=v1&redirect=%2Fcart")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
    assert!(shopper.cookie.is_some());

    shopper.post("/product/linen-shirt", "variantId=v1").await;

    let (status, cart) = shopper.get_json("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cartCount"], 2);
    assert_eq!(cart["cart"]["items"][0]["variantId"], "v1");
    assert_eq!(cart["cart"]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_add_to_cart_without_variant_only_redirects() {
    let mut shopper = Shopper::new(StubCommerce::new());

    for form in ["variantId=", "redirect=%2Fwishlist"] {
        let response = shopper.post("/product/linen-shirt", form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    let response = shopper.post("/product/linen-shirt", "variantId=").await;
    assert_eq!(location(&response), "/product/linen-shirt");

    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cartCount"], 0);
}

#[tokio::test]
async fn test_offsite_redirects_fall_back() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let response = shopper
        .post(
            "/product/linen-shirt",
            "variantId=v1&redirect=%2F%2Fevil.example",
        )
        .await;
    assert_eq!(location(&response), "/product/linen-shirt");

    let response = shopper
        .post(
            "/cart",
            "_action=delete&variantId=v1&redirect=https%3A%2F%2Fevil.example",
        )
        .await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_cart_set_quantity_clamps_and_delete_removes() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let response = shopper
        .post("/cart", "_action=set-quantity&variantId=v1&quantity=3")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cart"]["items"][0]["quantity"], 3);

    shopper
        .post("/cart", "_action=set-quantity&variantId=v1&quantity=0")
        .await;
    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cart"]["items"][0]["quantity"], 1);

    shopper.post("/cart", "_action=delete&variantId=v1").await;
    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cart"], Value::Null);
    assert_eq!(cart["cartCount"], 0);
}

#[tokio::test]
async fn test_incomplete_cart_actions_still_redirect() {
    let mut shopper = Shopper::new(StubCommerce::new());
    shopper
        .post("/cart", "_action=set-quantity&variantId=v1&quantity=2")
        .await;

    for form in [
        "_action=set-quantity&variantId=v1",
        "_action=set-quantity&variantId=v1&quantity=lots",
        "_action=bogus&variantId=v1",
        "variantId=v1&redirect=%2Fwishlist",
        "_action=delete",
    ] {
        let response = shopper.post("/cart", form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{form}");
    }

    let response = shopper.post("/cart", "variantId=v1&redirect=%2Fwishlist").await;
    assert_eq!(location(&response), "/wishlist");

    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cartCount"], 2);
}

#[tokio::test]
async fn test_incomplete_wishlist_actions_still_redirect() {
    let mut shopper = Shopper::new(StubCommerce::new());

    for form in ["_action=add&variantId=v1", "_action=shred&productId=p1&variantId=v1", ""] {
        let response = shopper.post("/wishlist", form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{form}");
        assert_eq!(location(&response), "/wishlist");
    }

    let (_, wishlist) = shopper.get_json("/wishlist").await;
    assert_eq!(wishlist["wishlist"], Value::Null);
}

#[tokio::test]
async fn test_move_to_cart_combines_quantities() {
    let mut shopper = Shopper::new(StubCommerce::new());

    shopper.post("/product/linen-shirt", "variantId=v1").await;
    shopper
        .post(
            "/wishlist",
            "_action=set-quantity&productId=p1&variantId=v1&quantity=2",
        )
        .await;

    let (_, wishlist) = shopper.get_json("/wishlist").await;
    assert_eq!(wishlist["wishlist"][0]["productId"], "p1");
    assert_eq!(wishlist["wishlist"][0]["quantity"], 2);

    let response = shopper
        .post("/wishlist", "_action=move-to-cart&variantId=v1")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/wishlist");

    let (_, wishlist) = shopper.get_json("/wishlist").await;
    assert_eq!(wishlist["wishlist"], Value::Null);

    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cart"]["items"][0]["quantity"], 3);
}

#[tokio::test]
async fn test_move_to_cart_without_wishlist_item_changes_nothing() {
    let mut shopper = Shopper::new(StubCommerce::new());

    shopper.post("/product/linen-shirt", "variantId=v1").await;
    let response = shopper
        .post("/wishlist", "_action=move-to-cart&variantId=v9")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, cart) = shopper.get_json("/cart").await;
    assert_eq!(cart["cartCount"], 1);
    assert_eq!(cart["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wishlist_marks_favorites() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let (_, home) = shopper.get_json("/").await;
    assert_eq!(home["featuredProducts"][0]["favorited"], false);

    shopper
        .post("/wishlist", "_action=add&productId=p1&variantId=v1")
        .await;

    let (_, home) = shopper.get_json("/").await;
    assert_eq!(home["featuredProducts"][0]["favorited"], true);
    assert_eq!(home["categories"][0]["slug"], "shirts");

    let (_, search) = shopper.get_json("/search?q=shirt&sort=price-asc").await;
    assert_eq!(search["products"]["products"][0]["favorited"], true);
    assert_eq!(search["sortByOptions"].as_array().unwrap().len(), 4);

    shopper
        .post("/wishlist", "_action=delete&variantId=v1")
        .await;
    let (_, home) = shopper.get_json("/").await;
    assert_eq!(home["featuredProducts"][0]["favorited"], false);
}

#[tokio::test]
async fn test_product_detail() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let (status, product) = shopper.get_json("/product/linen-shirt?Size=L").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["title"], "Linen Shirt");
    assert_eq!(product["selectedVariantId"], "v2");

    let (status, _) = shopper.get_json("/product/no-such-thing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_redirects_to_provider() {
    let commerce = StubCommerce::new();
    let mut shopper = Shopper::new(commerce.clone());

    let response = shopper.post("/actions/checkout", "").await;
    assert_eq!(location(&response), "/cart");
    assert!(commerce.checkouts().is_empty());

    shopper.post("/product/linen-shirt", "variantId=v1").await;
    let response = shopper.post("/actions/checkout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "https://checkout.example.test/c/1");

    let checkouts = commerce.checkouts();
    assert_eq!(checkouts.len(), 1);
    assert_eq!(checkouts[0][0].variant_id.as_str(), "v1");
}

#[tokio::test]
async fn test_failed_checkout_returns_to_cart() {
    let mut shopper = Shopper::new(StubCommerce::with_failing_checkout());

    shopper.post("/product/linen-shirt", "variantId=v1").await;
    let response = shopper.post("/actions/checkout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_set_language() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let response = shopper
        .post("/actions/set-language", "lang=es&redirect=%2Fcart")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    for form in ["lang=fr", "redirect=%2Fsearch"] {
        let response = shopper.post("/actions/set-language", form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{form}");
    }
    let response = shopper.post("/actions/set-language", "lang=fr").await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_health() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let (status, health) = shopper.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["swrRefreshesInFlight"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let mut shopper = Shopper::new(StubCommerce::new());

    let request = Request::get("/health")
        .header("x-request-id", "edge-42")
        .body(Body::empty())
        .unwrap();
    let response = shopper.send(request).await;
    assert_eq!(response.headers()["x-request-id"], "edge-42");

    let response = shopper
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}
