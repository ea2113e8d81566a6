//! Per-request tracing span, request ID propagation and response logging.
//!
//! The span carries a request ID (the caller's `X-Request-Id` when usable,
//! else a fresh ULID) and, for rating lookups, the professor being looked
//! up. The ID is echoed back in the response header.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::{Instrument, Level, field};

use crate::web::rate::RatingStatus;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID we accept before generating our own.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// The caller's request ID if it is printable and short enough, otherwise a new ULID.
pub fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_UPSTREAM_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| ulid::Ulid::new().to_string())
}

/// Level for the completion log line.
///
/// A lookup answers 200 even when the review sites could not be reached,
/// so its outcome decides the level before the status code does.
fn response_level(status: StatusCode, outcome: Option<RatingStatus>) -> Level {
    match (outcome, status.as_u16()) {
        (Some(RatingStatus::Error), _) => Level::WARN,
        (Some(RatingStatus::Found | RatingStatus::NotFound), _) => Level::INFO,
        (None, 200..=399) => Level::DEBUG,
        (None, 400..=499) => Level::INFO,
        (None, _) => Level::WARN,
    }
}

fn log_response(
    method: &Method,
    path: &str,
    status: StatusCode,
    outcome: Option<RatingStatus>,
    elapsed: Duration,
) {
    let level = response_level(status, outcome);
    let status = status.as_u16();
    let outcome = outcome.map(field::debug);
    let duration_ms = elapsed.as_millis() as u64;
    if level == Level::WARN {
        tracing::warn!(%method, path, status, outcome, duration_ms, "Response");
    } else if level == Level::INFO {
        tracing::info!(%method, path, status, outcome, duration_ms, "Response");
    } else {
        tracing::debug!(%method, path, status, outcome, duration_ms, "Response");
    }
}

#[derive(Clone)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let req_id = resolve_request_id(req.headers());
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        // `professor` is filled in by the rating handler once the name decodes.
        let span = tracing::info_span!("request", req_id = %req_id, professor = field::Empty);
        let header_value = HeaderValue::from_str(&req_id).ok();
        let start = Instant::now();

        let future = {
            let _entered = span.enter();
            self.inner.call(req)
        };

        Box::pin(
            async move {
                let mut result = future.await;

                match &mut result {
                    Ok(response) => {
                        let outcome = response.extensions().get::<RatingStatus>().copied();
                        log_response(&method, &path, response.status(), outcome, start.elapsed());
                        if let Some(value) = header_value {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                    }
                    Err(e) => {
                        tracing::error!(%method, path = %path, error = ?e, "Request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
