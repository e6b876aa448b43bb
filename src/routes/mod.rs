// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod catastro;
pub mod intranet;
pub mod profile;

use crate::error::Result;
use crate::models::ApiResponse;
use crate::AppState;
use axum::http::{header, Method};
use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub environment: String,
}

/// Health check response. No upstream calls: a healthy gateway with a dead
/// backend still reports healthy, and per-request errors say the rest.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    })
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub build_id: String,
    pub generated_at: String,
}

/// Version/build metadata for the deployed gateway.
async fn version_info() -> Json<VersionResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Obtain a CSRF token from the backend.
///
/// Django issues `csrftoken` as a cookie on any GET; the browser cannot read
/// backend cookies across origins, so the gateway extracts it.
async fn csrf_token(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Value>>> {
    let token = state.backend.client().fetch_csrf_token().await?;
    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "csrf_token": token }),
    )))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the portal URL and localhost (for dev)
    let public_url = state.config.public_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == public_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static("x-csrftoken"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/version", get(version_info))
        .route("/api/csrf", get(csrf_token))
        .merge(auth::routes())
        .merge(profile::routes())
        .merge(catastro::routes())
        .merge(intranet::routes())
        .layer(middleware::from_fn(
            crate::middleware::session::clear_stale_cookies,
        ))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
