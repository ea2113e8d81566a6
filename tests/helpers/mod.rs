//! Shared fixtures: an in-memory page fetcher and a router wired to it.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use rateprof::scrape::{FallbackSearch, PageFetcher, RmpScraper, ScrapeError, ScrapeSettings};
use rateprof::state::AppState;
use rateprof::web::create_router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use url::Url;

pub const SEARCH_PREFIX: &str = "https://rmp.test/search?query=";
pub const FALLBACK_PREFIX: &str = "https://google.test/search?q=";
pub const FALLBACK_QUALIFIER: &str = "+utd";
pub const FALLBACK_ORIGIN: &str = "https://google.test";

/// Search page listing `Last, First` at UT Dallas, linking to `/ShowRatings.jsp?tid={tid}`.
pub fn search_page(last: &str, first: &str, tid: u32) -> String {
    format!(
        r#"<html><body><ul>
          <li><a href="/ShowRatings.jsp?tid={tid}"><span class="name">
            <span class="main">{last}, {first}</span>
            <span class="sub">University of Texas at Dallas, Computer Science</span>
          </span></a></li>
        </ul></body></html>"#
    )
}

/// Profile page with a quality score plus difficulty and would-take-again feedback.
pub fn profile_page(quality: &str, difficulty: &str, take_again: &str) -> String {
    format!(
        r#"<html><body>
          <div class="RatingValue__Numerator-qw8sqy-2">{quality}</div>
          <div class="FeedbackItem__StyledFeedbackItem-uof32n-0">
            <div class="FeedbackItem__FeedbackNumber-uof32n-1">{take_again}</div>
            <div class="FeedbackItem__FeedbackDescription-uof32n-2">Would take again</div>
          </div>
          <div class="FeedbackItem__StyledFeedbackItem-uof32n-0">
            <div class="FeedbackItem__FeedbackNumber-uof32n-1">{difficulty}</div>
            <div class="FeedbackItem__FeedbackDescription-uof32n-2">Level of Difficulty</div>
          </div>
        </body></html>"#
    )
}

pub fn profile_url(tid: u32) -> String {
    format!("https://rmp.test/ShowRatings.jsp?tid={tid}")
}

/// Serves pages from a URL → body map; unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
    latency: Duration,
}

impl FixtureFetcher {
    /// A fetcher that waits `latency` before answering each request.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn page(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.pages.lock().unwrap().insert(url.into(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError> {
        self.requests.lock().unwrap().push(url.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.pages
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ScrapeError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub fetcher: Arc<FixtureFetcher>,
}

pub fn test_app() -> TestApp {
    test_app_with(FixtureFetcher::default(), Duration::from_secs(5))
}

pub fn test_app_with(fetcher: FixtureFetcher, lookup_timeout: Duration) -> TestApp {
    let fetcher = Arc::new(fetcher);
    let scraper = RmpScraper::new(
        fetcher.clone(),
        ScrapeSettings {
            search_url: SEARCH_PREFIX.to_owned(),
            ..ScrapeSettings::default()
        },
        FallbackSearch {
            search_url: FALLBACK_PREFIX.to_owned(),
            qualifier: FALLBACK_QUALIFIER.to_owned(),
            origin: FALLBACK_ORIGIN.to_owned(),
            ..FallbackSearch::default()
        },
    );
    let state = AppState::new(scraper, lookup_timeout);
    let router = create_router(state.clone());
    TestApp {
        router,
        state,
        fetcher,
    }
}

/// URL-encoded body whose single key is the JSON name object.
pub fn name_form(first: &str, last: &str) -> String {
    let json = serde_json::json!({ "FirstName": first, "LastName": last }).to_string();
    url::form_urlencoded::Serializer::new(String::new())
        .append_key_only(&json)
        .finish()
}

pub fn rate_request(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rateProf")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.into()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
