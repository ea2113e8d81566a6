//! Web API router construction.

use axum::{
    Router,
    http::StatusCode,
    routing::{any, get, post},
};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{rate, status};

/// Slack between the lookup bound and the hard per-request cutoff, so an
/// expired lookup still gets to write its JSON answer.
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Creates the web server router
pub fn create_router(app_state: AppState) -> Router {
    let request_timeout = app_state.lookup_timeout + RESPONSE_GRACE;

    let router = Router::new()
        .route("/", any(rate::greet))
        .route("/rateProf", post(rate::rate_prof))
        .route("/status", get(status::status))
        // Unknown paths get the greeting too, so any URL doubles as a liveness probe.
        .fallback(rate::greet)
        .with_state(app_state);

    router.layer((
        // Outermost: per-request span and outcome-aware response logging.
        RequestIdLayer,
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout),
    ))
}
