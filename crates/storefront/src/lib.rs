//! Storefront cache library.
//!
//! A storefront backend that sits in front of a commerce provider and keeps
//! it fast with two caches:
//! - [`swr`] - stale-while-revalidate cache for outbound provider requests
//! - [`images`] - on-disk cache of resized, re-encoded images
//!
//! The [`routes`] expose the catalog, a session-backed cart and wishlist,
//! checkout handoff, and the image endpoint. The binary and the integration
//! tests both build their router with [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod error;
pub mod images;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod swr;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the application router with sessions, tracing, and request IDs.
///
/// Sentry layers are left to the binary so tests run without a client.
pub fn app(state: AppState, secure_cookies: bool) -> Router {
    routes::routes()
        .layer(middleware::create_session_layer(secure_cookies))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
