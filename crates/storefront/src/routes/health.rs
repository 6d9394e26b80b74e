//! Liveness endpoint.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health check body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub uptime_seconds: i64,
    pub swr_refreshes_in_flight: usize,
    pub background_tasks: usize,
}

/// Liveness health check.
///
/// Reports process-local state only. The commerce provider is not contacted.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        uptime_seconds: (Utc::now() - state.started_at()).num_seconds(),
        swr_refreshes_in_flight: state.swr().refreshes_in_flight(),
        background_tasks: state.swr().pending_tasks(),
    })
}
