// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: login, logout, refresh, current user and the
//! password-reset flows.
//!
//! Tokens are issued by the backend and stored only in HTTP-only cookies;
//! the browser never sees them.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::session::{
    access_cookie, apply_renewed, expired_cookie, refresh_cookie, Session, ACCESS_COOKIE,
    REFRESH_COOKIE,
};
use crate::models::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/validate-reset-token", post(validate_reset_token))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

/// Log in: exchange credentials at the backend, set both token cookies.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let login = state
        .backend
        .client()
        .login(&request.email, &request.password)
        .await?;

    tracing::info!(email = %request.email, "Login successful");

    let secure = state.config.cookie_secure();
    let jar = jar
        .add(access_cookie(login.access.clone(), secure))
        .add(refresh_cookie(login.refresh.clone(), secure));

    let data = serde_json::json!({
        "user": login.user,
        "tokens": {
            "access": login.access,
            "refresh": login.refresh,
        },
    });

    Ok((jar, Json(ApiResponse::with_message(data, "Login successful"))))
}

/// Log out: drop both token cookies. No backend call; the refresh token
/// simply ages out server-side.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let secure = state.config.cookie_secure();
    let jar = jar
        .add(expired_cookie(ACCESS_COOKIE, secure))
        .add(expired_cookie(REFRESH_COOKIE, secure));

    (jar, Json(ApiResponse::message_only("Logout successful")))
}

/// Renew the access token from the refresh-token cookie.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);
    let refresh_token = session.refresh.as_deref().ok_or(AppError::Unauthorized)?;

    let access = state.backend.client().refresh(refresh_token).await?;

    tracing::info!("Access token renewed");

    let jar = jar.add(access_cookie(access.clone(), state.config.cookie_secure()));
    let data = serde_json::json!({ "access": access });

    Ok((jar, Json(ApiResponse::with_message(data, "Token renewed"))))
}

/// Current user, via the backend under the refresh-and-retry contract.
async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            async move { client.get_value("/api/users/me/", &[], &token).await }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "invalid email format"))]
    email: String,
}

/// Request a password-reset email.
///
/// Backend 4xx answers are swallowed: the response never reveals whether the
/// address exists.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let body = serde_json::json!({ "email": request.email });
    match state
        .backend
        .client()
        .post_public("/auth/forgot-password/", &body)
        .await
    {
        Ok(_) => {}
        Err(AppError::UpstreamStatus { status, .. }) => {
            tracing::warn!(status, "Password-reset request rejected by backend");
        }
        Err(e) => return Err(e),
    }

    Ok(Json(ApiResponse::message_only(
        "If the email exists in our system, a recovery link has been sent",
    )))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
    confirm_password: String,
}

/// Confirm a password reset with the emailed token and a new password.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    if request.token.is_empty() {
        return Err(AppError::BadRequest("Reset token is required".to_string()));
    }
    if request.new_password != request.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }
    check_password_strength(&request.new_password)?;

    let body = serde_json::json!({
        "token": request.token,
        "new_password": request.new_password,
        "confirm_password": request.confirm_password,
    });
    state
        .backend
        .client()
        .post_public("/api/password-reset/confirm/", &body)
        .await?;

    Ok(Json(ApiResponse::message_only("Password updated")))
}

/// Password policy mirrored from the backend so obviously bad values never
/// leave the gateway.
fn check_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_upper && has_lower && has_digit) {
        return Err(AppError::BadRequest(
            "Password must contain uppercase, lowercase and a digit".to_string(),
        ));
    }

    Ok(())
}

#[derive(Deserialize)]
pub struct ValidateResetTokenRequest {
    token: String,
}

/// Check whether a password-reset token is still valid.
async fn validate_reset_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateResetTokenRequest>,
) -> Result<Json<ApiResponse<Value>>> {
    if request.token.is_empty() {
        return Err(AppError::BadRequest("Reset token is required".to_string()));
    }

    let body = serde_json::json!({ "token": request.token });
    let payload = state
        .backend
        .client()
        .post_public("/api/password-reset/validate-token/", &body)
        .await?;

    Ok(Json(ApiResponse::ok(payload)))
}
