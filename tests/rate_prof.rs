//! End-to-end tests for the HTTP surface against canned review-site pages.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::*;
use rateprof::data::NameKey;
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn greeting_is_exact() {
    let app = test_app();

    for (method, uri) in [("GET", "/"), ("POST", "/"), ("GET", "/favicon.ico")] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from("ignored"))
            .unwrap();
        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::OK, "{method} {uri}");
        assert_eq!(body_string(response).await, r#"{"text":"helloworld"}"#);
    }
    assert_eq!(app.fetcher.request_count(), 0);
}

#[tokio::test]
async fn found_rating_is_served_from_cache_afterwards() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), search_page("Doe", "Jane", 111))
        .page(profile_url(111), profile_page("4.5", "3.2", "85%"));

    let first = send(&app.router, rate_request(name_form("Jane", "Doe"))).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(
        first,
        json!({
            "status": "found",
            "values": [
                { "name": "Quality", "content": "4.5" },
                { "name": "Would Take Again", "content": "85%" },
                { "name": "Difficulty", "content": "3.2" },
            ]
        })
    );
    assert_eq!(app.fetcher.request_count(), 2);

    let second = body_json(send(&app.router, rate_request(name_form("Jane", "Doe"))).await).await;
    assert_eq!(second, first);
    assert_eq!(app.fetcher.request_count(), 2, "cache hit must not fetch");
    assert!(app.state.rating_cache.get(&NameKey::new("Jane", "Doe")).is_some());
}

#[tokio::test]
async fn unknown_professor_is_ok_and_empty() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Zzz+Qqq"), "<html><body></body></html>")
        .page(
            format!("{FALLBACK_PREFIX}Zzz+Qqq{FALLBACK_QUALIFIER}"),
            r#"<a href="/search?q=other">Other</a>"#,
        );

    let response = send(&app.router, rate_request(name_form("Zzz", "Qqq"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "notFound", "values": [] })
    );
    assert!(app.state.rating_cache.is_empty());

    // Misses are not remembered, so asking again scrapes again.
    send(&app.router, rate_request(name_form("Zzz", "Qqq"))).await;
    assert_eq!(app.fetcher.request_count(), 4);
}

#[tokio::test]
async fn unreachable_sites_report_error_status() {
    let app = test_app();

    let response = send(&app.router, rate_request(name_form("Jane", "Doe"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "error", "values": [] })
    );
}

#[tokio::test]
async fn fallback_result_is_returned_but_not_cached() {
    let app = test_app();
    let hit = format!("{FALLBACK_ORIGIN}/url?q=https://rmp.test/ShowRatings.jsp%3Ftid%3D9");
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), "<html></html>")
        .page(
            format!("{FALLBACK_PREFIX}Jane+Doe{FALLBACK_QUALIFIER}"),
            r#"<a href="/url?q=https://rmp.test/ShowRatings.jsp%3Ftid%3D9">Jane Doe</a>"#,
        )
        .page(hit.clone(), profile_page("2.0", "4.8", "10%"));

    let body = body_json(send(&app.router, rate_request(name_form("Jane", "Doe"))).await).await;
    assert_eq!(body["status"], "found");
    assert_eq!(body["values"][0], json!({ "name": "Quality", "content": "2.0" }));
    assert_eq!(app.fetcher.requests().last(), Some(&hit));
    assert!(app.state.rating_cache.is_empty());
}

#[tokio::test]
async fn cache_keys_are_case_sensitive() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), search_page("Doe", "Jane", 111))
        .page(format!("{SEARCH_PREFIX}jane+doe"), search_page("Doe", "Jane", 111))
        .page(profile_url(111), profile_page("4.5", "3.2", "85%"));

    send(&app.router, rate_request(name_form("Jane", "Doe"))).await;
    send(&app.router, rate_request(name_form("jane", "doe"))).await;

    assert_eq!(app.state.rating_cache.len(), 2);
    assert_eq!(app.fetcher.request_count(), 4);
}

#[tokio::test]
async fn undecodable_name_is_rejected() {
    let app = test_app();

    for body in ["", "hello=world", "%7Bnot+json%7D"] {
        let response = send(&app.router, rate_request(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_NAME");
    }
    assert_eq!(app.fetcher.request_count(), 0);
}

#[tokio::test]
async fn last_decodable_form_key_is_used() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}John+Smith"), search_page("Smith", "John", 7))
        .page(profile_url(7), profile_page("3.9", "2.5", "70%"));

    let body = format!(
        "{}&garbage&{}",
        name_form("Jane", "Doe"),
        name_form("John", "Smith")
    );
    let json = body_json(send(&app.router, rate_request(body)).await).await;

    assert_eq!(json["status"], "found");
    assert_eq!(
        app.fetcher.requests().first().map(String::as_str),
        Some("https://rmp.test/search?query=John+Smith")
    );
}

#[tokio::test]
async fn concurrent_lookups_keep_their_own_entries() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), search_page("Doe", "Jane", 1))
        .page(profile_url(1), profile_page("4.5", "3.2", "85%"))
        .page(format!("{SEARCH_PREFIX}John+Smith"), search_page("Smith", "John", 2))
        .page(profile_url(2), profile_page("1.5", "4.9", "5%"));

    let (jane, john) = tokio::join!(
        send(&app.router, rate_request(name_form("Jane", "Doe"))),
        send(&app.router, rate_request(name_form("John", "Smith"))),
    );
    assert_eq!(body_json(jane).await["values"][0]["content"], "4.5");
    assert_eq!(body_json(john).await["values"][0]["content"], "1.5");

    let cache = &app.state.rating_cache;
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.get(&NameKey::new("Jane", "Doe")).unwrap().values[0].content,
        "4.5"
    );
    assert_eq!(
        cache.get(&NameKey::new("John", "Smith")).unwrap().values[0].content,
        "1.5"
    );
}

#[tokio::test]
async fn status_reports_cache_size() {
    let app = test_app();
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), search_page("Doe", "Jane", 111))
        .page(profile_url(111), profile_page("4.5", "3.2", "85%"));
    send(&app.router, rate_request(name_form("Jane", "Doe"))).await;

    let request = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let json = body_json(send(&app.router, request).await).await;
    assert_eq!(json["status"], "active");
    assert_eq!(json["cachedEntries"], 1);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = test_app();

    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "abc123")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.headers()["x-request-id"], "abc123");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = send(&app.router, request).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn slow_lookup_answers_error_before_the_request_deadline() {
    let app = test_app_with(
        FixtureFetcher::slow(Duration::from_millis(300)),
        Duration::from_millis(400),
    );
    app.fetcher
        .page(format!("{SEARCH_PREFIX}Jane+Doe"), "<html></html>")
        .page(
            format!("{FALLBACK_PREFIX}Jane+Doe{FALLBACK_QUALIFIER}"),
            "<html></html>",
        );

    let start = Instant::now();
    let response = send(&app.router, rate_request(name_form("Jane", "Doe"))).await;
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "error", "values": [] })
    );
    assert!(app.state.rating_cache.is_empty());
}

#[tokio::test]
async fn non_utf8_body_is_rejected() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/rateProf")
        .body(Body::from(vec![0xff, 0xfe, b'=']))
        .unwrap();

    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert_eq!(app.fetcher.request_count(), 0);
}

#[tokio::test]
async fn oversized_request_id_is_replaced() {
    let app = test_app();
    let long = "a".repeat(200);

    let request = Request::builder()
        .uri("/")
        .header("x-request-id", long.as_str())
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    let echoed = response.headers()["x-request-id"].to_str().unwrap();
    assert_ne!(echoed, long);
    assert!(ulid::Ulid::from_string(echoed).is_ok());
}
