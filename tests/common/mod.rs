// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: app construction and response inspection.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::http::header;
use axum::response::Response;
use portal_gateway::{config::Config, AppState};
use std::sync::Arc;

/// Build the app against explicit upstream URLs (normally wiremock servers).
pub fn create_test_app(backend_url: &str, intranet_url: &str) -> axum::Router {
    let mut config = Config::test_default();
    config.backend_api_url = backend_url.trim_end_matches('/').to_string();
    config.intranet_api_url = intranet_url.trim_end_matches('/').to_string();
    portal_gateway::routes::create_router(Arc::new(AppState::new(config)))
}

/// Build the app with unroutable upstreams, for tests that must never make
/// an upstream call.
pub fn create_offline_app() -> axum::Router {
    create_test_app("http://127.0.0.1:1", "http://127.0.0.1:1")
}

/// All Set-Cookie header values on a response.
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Find the Set-Cookie value for a named cookie, panicking when absent.
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not valid JSON")
}
