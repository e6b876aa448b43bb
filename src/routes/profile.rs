// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: profile data, profile image, roles and settings.
//!
//! All handlers proxy to the backend under the refresh-and-retry contract
//! and pass payloads through untouched.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::session::{apply_renewed, Session};
use crate::models::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me/profile", get(get_profile).put(put_profile))
        .route("/api/users/me/profile/image", post(upload_profile_image))
        .route("/api/users/me/roles", get(get_roles))
        .route("/api/users/me/settings", get(get_settings).put(put_settings))
}

/// CSRF token forwarded from the browser, when present. The backend expects
/// it on mutating requests.
fn csrf_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-csrftoken")
        .or_else(|| headers.get("csrftoken"))
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            async move { client.get_value("/user/me/profile/", &[], &token).await }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

async fn put_profile(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);
    let csrf = csrf_from_headers(&headers);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let body = body.clone();
            let csrf = csrf.clone();
            async move {
                client
                    .send_json(
                        reqwest::Method::PUT,
                        "/user/me/profile/",
                        &body,
                        csrf.as_deref(),
                        &token,
                    )
                    .await
            }
        })
        .await?;

    tracing::info!("Profile updated");

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((
        jar,
        Json(ApiResponse::with_message(outcome.value, "Profile updated")),
    ))
}

/// Forward a profile-image upload. The multipart body is passed through
/// byte-for-byte; the original Content-Type header keeps the boundary intact.
async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let body = body.to_vec();
            let content_type = content_type.clone();
            async move {
                client
                    .post_bytes("/user/me/profile/image/", body, content_type, &token)
                    .await
            }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((
        jar,
        Json(ApiResponse::with_message(outcome.value, "Image updated")),
    ))
}

async fn get_roles(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            async move { client.get_value("/user/my-groups/", &[], &token).await }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            async move { client.get_value("/user/me/settings/", &[], &token).await }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

async fn put_settings(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);
    let csrf = csrf_from_headers(&headers);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let body = body.clone();
            let csrf = csrf.clone();
            async move {
                client
                    .send_json(
                        reqwest::Method::PUT,
                        "/user/me/settings/",
                        &body,
                        csrf.as_deref(),
                        &token,
                    )
                    .await
            }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((
        jar,
        Json(ApiResponse::with_message(outcome.value, "Settings updated")),
    ))
}
