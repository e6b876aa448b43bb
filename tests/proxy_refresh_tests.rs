// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh-and-retry contract tests.
//!
//! These drive a full router against a mock backend and verify the
//! authorized-call contract: no upstream calls without tokens, exactly one
//! call with a valid token, exactly one refresh plus one retry on 401, and
//! session termination when the refresh itself fails.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as req_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_no_tokens_returns_unauthenticated_without_backend_call() {
    let backend = MockServer::start().await;

    // Any backend traffic at all fails the test.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // No cookies arrived, so none should be cleared.
    assert!(common::set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_valid_access_token_calls_backend_once_and_passes_payload_through() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(req_header("authorization", "Bearer good-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 7, "email": "a@b.net"})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(header::COOKIE, "access-token=good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // No refresh happened, so no cookie is rewritten.
    assert!(common::set_cookie_headers(&response).is_empty());

    let body = common::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"], json!({"id": 7, "email": "a@b.net"}));
}

#[tokio::test]
async fn test_expired_access_refreshes_once_retries_once_and_sets_cookie() {
    let backend = MockServer::start().await;

    // First attempt with the expired token is rejected.
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(req_header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&backend)
        .await;

    // Refresh endpoint must be hit exactly once.
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({"refresh": "valid123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "renewed456"})))
        .expect(1)
        .mount(&backend)
        .await;

    // Retry with the renewed token must be hit exactly once.
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(req_header("authorization", "Bearer renewed456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(
                    header::COOKIE,
                    "access-token=expired; refresh-token=valid123",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The renewed token is propagated back to the browser.
    let cookies = common::set_cookie_headers(&response);
    let access = common::find_cookie(&cookies, "access-token");
    assert!(access.starts_with("access-token=renewed456"));
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Lax"));
    assert!(access.contains("Max-Age=1800"));

    let body = common::body_json(response).await;
    assert_eq!(body["data"], json!({"id": 42}));
}

#[tokio::test]
async fn test_failed_refresh_returns_unauthenticated_and_clears_cookies() {
    let backend = MockServer::start().await;

    // Original call rejected once; it must NOT be retried after the failed
    // refresh.
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "refresh expired"})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(header::COOKIE, "access-token=expired; refresh-token=dead")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Stale cookies are cleared so the browser stops resending them.
    let cookies = common::set_cookie_headers(&response);
    let access = common::find_cookie(&cookies, "access-token");
    let refresh = common::find_cookie(&cookies, "refresh-token");
    assert!(access.contains("Max-Age=0"));
    assert!(refresh.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_rejected_token_without_refresh_is_unauthenticated_after_one_call() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&backend)
        .await;

    // The refresh endpoint must never be called without a refresh token.
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
        .expect(0)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(header::COOKIE, "access-token=expired")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_access_with_refresh_token_refreshes_before_calling() {
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({"refresh": "valid123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh789"})))
        .expect(1)
        .mount(&backend)
        .await;

    // The only profile call happens with the freshly issued token.
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(req_header("authorization", "Bearer fresh789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(header::COOKIE, "refresh-token=valid123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = common::set_cookie_headers(&response);
    let access = common::find_cookie(&cookies, "access-token");
    assert!(access.starts_with("access-token=fresh789"));
}

#[tokio::test]
async fn test_upstream_error_status_is_propagated() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catastro/edificio-general/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "unknown refcat"})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/catastro/edificio-general?refcat=XYZ123")
                .header(header::COOKIE, "access-token=good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("unknown refcat"));
}

#[tokio::test]
async fn test_street_search_converts_upstream_404_to_empty_result() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catastro/calles/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "no matches"})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = common::create_test_app(&backend.uri(), "http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/catastro/calles?q=gran%20via")
                .header(header::COOKIE, "access-token=good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"], json!([]));
}
