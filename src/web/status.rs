//! Service status handler.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use tracing::trace;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: &'static str,
    version: &'static str,
    commit: &'static str,
    cached_entries: usize,
    timestamp: String,
}

/// `GET /status`
pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    trace!("status requested");
    Json(StatusResponse {
        status: "active",
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_HASH"),
        cached_entries: state.rating_cache.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
