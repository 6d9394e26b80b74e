//! Content pages.

use axum::{
    Json,
    extract::{Path, State},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::FullPage;
use crate::error::{AppError, Result};
use crate::models::load_language;
use crate::state::AppState;

/// Display a content page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Json<FullPage>> {
    let language = load_language(&session).await;

    state
        .commerce()
        .get_page(language, &slug)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(slug))
}
