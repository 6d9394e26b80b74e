//! Image transform endpoint.

use axum::extract::{OriginalUri, RawQuery, State};
use axum::http::Method;
use tracing::instrument;

use crate::images::{ImageQuery, ImageQueryParams, ImageResponse};
use crate::state::AppState;

/// Serve a transformed image.
///
/// The cache key includes the full request path and query string, so two
/// URLs asking for the same transform with differently ordered parameters
/// are cached separately. Query parsing never rejects the request; a
/// malformed query ends up as the placeholder like any other failure.
#[instrument(skip(state, raw_query))]
pub async fn image(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw_query): RawQuery,
) -> ImageResponse {
    let query = ImageQuery::from(ImageQueryParams::from_query(raw_query.as_deref()));
    state
        .images()
        .serve(method.as_str(), &uri.to_string(), &query)
        .await
}
