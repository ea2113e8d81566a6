//! Greeting and professor rating handlers.

use axum::body::Bytes;
use axum::Extension;
use axum::extract::{RawQuery, State};
use axum::response::Json;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{Span, debug};

use crate::data::rating::{RatingRecord, RatingValue};
use crate::data::NameKey;
use crate::scrape::{LookupOutcome, LookupStatus};
use crate::state::AppState;
use crate::utils::log_if_slow;
use crate::web::error::ApiError;

const SLOW_LOOKUP: Duration = Duration::from_secs(10);

#[derive(Serialize)]
pub struct Greeting {
    pub text: &'static str,
}

/// Lookup result as reported to clients.
///
/// Also attached to the response extensions for the request logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingStatus {
    Found,
    NotFound,
    Error,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub status: RatingStatus,
    pub values: Vec<RatingValue>,
}

impl RateResponse {
    fn found(record: &RatingRecord) -> Self {
        Self {
            status: RatingStatus::Found,
            values: record.values.clone(),
        }
    }
}

impl From<LookupOutcome> for RateResponse {
    fn from(outcome: LookupOutcome) -> Self {
        let status = match outcome.status {
            LookupStatus::Found(_) => RatingStatus::Found,
            LookupStatus::NotFound => RatingStatus::NotFound,
            LookupStatus::Unreachable => RatingStatus::Error,
        };
        Self {
            status,
            values: outcome.record.values,
        }
    }
}

/// `ANY /` and every unrouted path.
pub(super) async fn greet() -> Json<Greeting> {
    Json(Greeting { text: "helloworld" })
}

/// `POST /rateProf`
///
/// Each form key (body first, then query string) is a JSON object like
/// `{"FirstName":"Jane","LastName":"Doe"}`; the last one that decodes is used.
/// The body is parsed as form data whatever its declared content type.
pub(super) async fn rate_prof(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<(Extension<RatingStatus>, Json<RateResponse>), ApiError> {
    if std::str::from_utf8(&body).is_err() {
        return Err(ApiError::bad_request("form body is not valid UTF-8"));
    }

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(&body)
        .chain(url::form_urlencoded::parse(
            query.as_deref().unwrap_or_default().as_bytes(),
        ))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let key = NameKey::from_form_keys(pairs.iter().map(|(k, _)| k.as_str()))?;
    Span::current().record("professor", tracing::field::display(&key));

    let response = if let Some(record) = state.rating_cache.get(&key) {
        debug!(name = %key, "cache hit -- sending cached data");
        RateResponse::found(&record)
    } else {
        let start = Instant::now();
        let outcome = state.scraper.lookup_within(&key, state.lookup_timeout).await;
        log_if_slow(start, SLOW_LOOKUP, "rating lookup");

        if outcome.is_cacheable() {
            state.rating_cache.insert(key, outcome.record.clone());
        }
        RateResponse::from(outcome)
    };

    Ok((Extension(response.status), Json(response)))
}
